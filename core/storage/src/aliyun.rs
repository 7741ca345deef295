//! Aliyun OSS storage provider.

use async_trait::async_trait;
use opendal::services::Oss;
use tracing::info;

use crate::bucket::BucketClient;
use crate::provider::{provider_type, ListedEntry, ObjectState, StorageProvider};
use cloudkit_common::{AliyunOssConfig, KeyPrefix, ProviderArgs, Result, StorageConfig};

/// Aliyun OSS storage provider.
///
/// Keys live under the configured `path` inside the bucket.
pub struct AliyunOssStorage {
    bucket_name: String,
    bucket: BucketClient,
}

impl AliyunOssStorage {
    /// Create a client for the bucket described by `args`.
    ///
    /// # Errors
    /// - `ArgumentInvalid` if bucket, keys or endpoint are empty
    /// - `ProviderInit` if the client cannot be built
    pub fn new(args: &AliyunOssConfig) -> Result<Self> {
        args.validate()?;

        let builder = Oss::default()
            .bucket(&args.bucket)
            .endpoint(&args.endpoint)
            .access_key_id(&args.access_key)
            .access_key_secret(args.secret_key.expose());
        let bucket = BucketClient::new(
            provider_type::ALIYUN_OSS,
            builder,
            KeyPrefix::new(&args.path),
        )?;

        info!(
            bucket = %args.bucket,
            endpoint = %args.endpoint,
            path = bucket.prefix().as_str(),
            "aliyun oss storage ready"
        );
        Ok(Self {
            bucket_name: args.bucket.clone(),
            bucket,
        })
    }

    /// Create an Aliyun OSS provider from its config section.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::new(config.args::<AliyunOssConfig>()?)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket_name
    }

    pub fn prefix(&self) -> &KeyPrefix {
        self.bucket.prefix()
    }
}

#[async_trait]
impl StorageProvider for AliyunOssStorage {
    fn provider_type(&self) -> &'static str {
        provider_type::ALIYUN_OSS
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

    fn test_args() -> AliyunOssConfig {
        AliyunOssConfig {
            endpoint: "https://oss-cn-hangzhou.aliyuncs.com".to_string(),
            access_key: "ak".to_string(),
            secret_key: "sk".into(),
            path: "/dify/".to_string(),
            bucket: "my-bucket".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_normalizes_path() {
        let storage = AliyunOssStorage::new(&test_args()).unwrap();
        assert_eq!(storage.bucket(), "my-bucket");
        assert_eq!(storage.prefix().as_str(), "dify/");
        assert_eq!(storage.provider_type(), "aliyun_oss");
    }

    #[test]
    fn test_missing_endpoint_is_argument_invalid() {
        let args = AliyunOssConfig {
            endpoint: String::new(),
            ..test_args()
        };
        let err = AliyunOssStorage::new(&args).err().unwrap();
        assert_eq!(err.reason(), "argument invalid");
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn test_v4_signing_is_rejected() {
        let args = AliyunOssConfig {
            auth_version: "v4".to_string(),
            ..test_args()
        };
        let err = AliyunOssStorage::new(&args).err().unwrap();
        assert_eq!(err.reason(), "argument invalid");
        assert!(err.to_string().contains("auth_version"));

        let args = AliyunOssConfig {
            auth_version: "v1".to_string(),
            ..test_args()
        };
        assert!(AliyunOssStorage::new(&args).is_ok());
    }
}
