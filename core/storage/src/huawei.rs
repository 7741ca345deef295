//! Huawei OBS storage provider.

use async_trait::async_trait;
use opendal::services::Obs;
use tracing::info;

use crate::bucket::BucketClient;
use crate::provider::{provider_type, ListedEntry, ObjectState, StorageProvider};
use cloudkit_common::{HuaweiObsConfig, KeyPrefix, ProviderArgs, Result, StorageConfig};

/// Huawei OBS storage provider.
pub struct HuaweiObsStorage {
    bucket_name: String,
    bucket: BucketClient,
}

impl HuaweiObsStorage {
    /// Create a client for the bucket described by `args`.
    ///
    /// # Errors
    /// - `ArgumentInvalid` if bucket, keys or server are empty
    /// - `ProviderInit` if the client cannot be built
    pub fn new(args: &HuaweiObsConfig) -> Result<Self> {
        args.validate()?;

        let builder = Obs::default()
            .bucket(&args.bucket)
            .endpoint(&args.server)
            .access_key_id(&args.access_key)
            .secret_access_key(args.secret_key.expose());
        let bucket = BucketClient::new(
            provider_type::HUAWEI_OBS,
            builder,
            KeyPrefix::new(&args.prefix),
        )?;

        info!(bucket = %args.bucket, server = %args.server, "huawei obs storage ready");
        Ok(Self {
            bucket_name: args.bucket.clone(),
            bucket,
        })
    }

    /// Create a Huawei OBS provider from its config section.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::new(config.args::<HuaweiObsConfig>()?)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket_name
    }
}

#[async_trait]
impl StorageProvider for HuaweiObsStorage {
    fn provider_type(&self) -> &'static str {
        provider_type::HUAWEI_OBS
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
    fn test_requires_server() {
        let args = HuaweiObsConfig {
            bucket: "my-bucket".to_string(),
            access_key: "ak".to_string(),
            secret_key: "sk".into(),
            ..Default::default()
        };
        let err = HuaweiObsStorage::new(&args).err().unwrap();
        assert_eq!(err.reason(), "argument invalid");
        assert!(err.to_string().contains("server"));
    }
}
