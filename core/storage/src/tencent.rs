//! Tencent COS storage provider.

use async_trait::async_trait;
use opendal::services::Cos;
use tracing::info;

use crate::bucket::BucketClient;
use crate::provider::{provider_type, ListedEntry, ObjectState, StorageProvider};
use cloudkit_common::{KeyPrefix, ProviderArgs, Result, StorageConfig, TencentCosConfig};

/// Tencent COS storage provider.
pub struct TencentCosStorage {
    bucket_name: String,
    region: String,
    bucket: BucketClient,
}

impl TencentCosStorage {
    /// Create a client for the bucket described by `args`.
    ///
    /// The endpoint is derived from the region.
    ///
    /// # Errors
    /// - `ArgumentInvalid` if bucket, region or credentials are empty
    /// - `ProviderInit` if the client cannot be built
    pub fn new(args: &TencentCosConfig) -> Result<Self> {
        args.validate()?;

        let endpoint = args.endpoint();
        let builder = Cos::default()
            .bucket(&args.bucket)
            .endpoint(&endpoint)
            .secret_id(&args.secret_id)
            .secret_key(args.secret_key.expose());
        let bucket = BucketClient::new(
            provider_type::TENCENT_COS,
            builder,
            KeyPrefix::new(&args.prefix),
        )?;

        info!(bucket = %args.bucket, %endpoint, "tencent cos storage ready");
        Ok(Self {
            bucket_name: args.bucket.clone(),
            region: args.region.clone(),
            bucket,
        })
    }

    /// Create a Tencent COS provider from its config section.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::new(config.args::<TencentCosConfig>()?)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket_name
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl StorageProvider for TencentCosStorage {
    fn provider_type(&self) -> &'static str {
        provider_type::TENCENT_COS
    }

    async fn save(&self, key: &str, data: Vec<u8>) -> Result<()> {
        self.bucket.save(key, data).await
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        self.bucket.load(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.bucket.exists(key).await
    }

    async fn stat(&self, key: &str) -> Result<ObjectState> {
        self.bucket.stat(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ListedEntry>> {
        self.bucket.list(prefix).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.bucket.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_builds_client() {
        let args = TencentCosConfig {
            region: "ap-guangzhou".to_string(),
            secret_id: "id".to_string(),
            secret_key: "key".into(),
            bucket: "examplebucket-1250000000".to_string(),
            prefix: String::new(),
        };
        let storage = TencentCosStorage::new(&args).unwrap();
        assert_eq!(storage.bucket(), "examplebucket-1250000000");
        assert_eq!(storage.region(), "ap-guangzhou");
        assert_eq!(storage.provider_type(), "tencent_cos");
    }

    #[test]
    fn test_missing_secret_is_argument_invalid() {
        let args = TencentCosConfig {
            region: "ap-guangzhou".to_string(),
            secret_id: "id".to_string(),
            bucket: "examplebucket-1250000000".to_string(),
            ..Default::default()
        };
        let err = TencentCosStorage::new(&args).err().unwrap();
        assert!(err.to_string().contains("secret_key"));
    }
}
