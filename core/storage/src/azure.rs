//! Azure Blob Storage provider.

use async_trait::async_trait;
use opendal::services::Azblob;
use tracing::info;

use crate::bucket::BucketClient;
use crate::provider::{provider_type, ListedEntry, ObjectState, StorageProvider};
use cloudkit_common::{AzureBlobConfig, Error, KeyPrefix, ProviderArgs, Result, StorageConfig};

/// Azure Blob Storage provider bound to one container.
pub struct AzureBlobStorage {
    container: String,
    bucket: BucketClient,
}

impl AzureBlobStorage {
    /// Create a client for the container described by `args`.
    ///
    /// Account name, key and endpoint are taken from the connection string.
    ///
    /// # Errors
    /// - `ArgumentInvalid` if connection string or container name is empty
    /// - `ProviderInit` if the connection string cannot be parsed
    pub fn new(args: &AzureBlobConfig) -> Result<Self> {
        args.validate()?;

        let builder = Azblob::from_connection_string(args.connection_string.expose())
            .map_err(|e| Error::provider_init("invalid azure connection string", e))?
            .container(&args.container_name);
        let bucket = BucketClient::new(
            provider_type::AZURE_BLOB,
            builder,
            KeyPrefix::new(&args.prefix),
        )?;

        info!(container = %args.container_name, "azure blob storage ready");
        Ok(Self {
            container: args.container_name.clone(),
            bucket,
        })
    }

    /// Create an Azure Blob provider from its config section.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::new(config.args::<AzureBlobConfig>()?)
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn prefix(&self) -> &KeyPrefix {
        self.bucket.prefix()
    }
}

#[async_trait]
impl StorageProvider for AzureBlobStorage {
    fn provider_type(&self) -> &'static str {
        provider_type::AZURE_BLOB
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
    fn test_requires_container() {
        let args = AzureBlobConfig {
            connection_string: "AccountName=acct;AccountKey=a2V5".into(),
            ..Default::default()
        };
        let err = AzureBlobStorage::new(&args).err().unwrap();
        assert_eq!(err.reason(), "argument invalid");
        assert!(err.to_string().contains("container_name"));
    }

    #[test]
    fn test_from_config_requires_section() {
        let err = AzureBlobStorage::from_config(&StorageConfig::default()).err().unwrap();
        assert!(err.to_string().contains("can't find Azure Blob argument"));
    }
}
