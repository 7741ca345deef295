//! Google Cloud Storage provider.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use opendal::services::Gcs;
use tracing::info;

use crate::bucket::BucketClient;
use crate::provider::{provider_type, ListedEntry, ObjectState, StorageProvider};
use cloudkit_common::{Error, GoogleStorageConfig, KeyPrefix, ProviderArgs, Result, StorageConfig};

/// Google Cloud Storage provider.
///
/// Authenticates with a service account whose JSON key is passed
/// base64-encoded in the config.
pub struct GcsStorage {
    bucket_name: String,
    bucket: BucketClient,
}

impl GcsStorage {
    /// Create a client for the bucket described by `args`.
    ///
    /// # Errors
    /// - `ArgumentInvalid` if bucket or credentials are empty
    /// - `ProviderInit` if the credentials are not valid base64 or the
    ///   client cannot be built
    pub fn new(args: &GoogleStorageConfig) -> Result<Self> {
        args.validate()?;

        let credentials = args.credentials_b64.expose().trim();
        STANDARD.decode(credentials).map_err(|e| {
            Error::provider_init("credentials must be a base64 encoded string", e)
        })?;

        let builder = Gcs::default().bucket(&args.bucket).credential(credentials);
        let bucket = BucketClient::new(provider_type::GCS, builder, KeyPrefix::new(&args.prefix))?;

        info!(bucket = %args.bucket, "google cloud storage ready");
        Ok(Self {
            bucket_name: args.bucket.clone(),
            bucket,
        })
    }

    /// Create a GCS provider from its config section.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::new(config.args::<GoogleStorageConfig>()?)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket_name
    }
}

#[async_trait]
impl StorageProvider for GcsStorage {
    fn provider_type(&self) -> &'static str {
        provider_type::GCS
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
