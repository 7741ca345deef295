//! AWS S3 storage provider.
//!
//! Talks to S3 and S3-compatible services (MinIO, R2, ...) through the
//! official AWS SDK. The bucket is probed on construction and created if
//! it does not exist yet.

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::{ByteStream, DateTime as SdkDateTime};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::provider::{provider_type, ListedEntry, ObjectState, StorageProvider};
use cloudkit_common::{Error, KeyPrefix, ProviderArgs, Result, S3Config, StorageConfig};

/// Region in which buckets are created without a location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// Name reported for static credentials.
const CREDENTIALS_SOURCE: &str = "cloudkit";

/// AWS S3 storage provider.
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: KeyPrefix,
}

impl S3Storage {
    /// Connect to the bucket described by `args`.
    ///
    /// # Postconditions
    /// - The bucket exists (created if the probe reported it missing)
    ///
    /// # Errors
    /// - `ArgumentInvalid` if bucket or region is empty
    /// - `ProviderInit` if the bucket is missing and cannot be created
    pub async fn connect(args: &S3Config) -> Result<Self> {
        args.validate()?;

        let client = Self::build_client(args).await;
        let storage = Self::with_client(client, &args.bucket, &args.prefix);
        storage.ensure_bucket(&args.region).await?;

        info!(bucket = %args.bucket, region = %args.region, "s3 storage ready");
        Ok(storage)
    }

    /// Create an S3 provider from its config section.
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        let args = config.args::<S3Config>()?;
        Self::connect(args).await
    }

    /// Wrap an already configured client without probing the bucket.
    pub fn with_client(client: Client, bucket: &str, prefix: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            prefix: KeyPrefix::new(prefix),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &KeyPrefix {
        &self.prefix
    }

    async fn build_client(args: &S3Config) -> Client {
        let region = Region::new(args.region.clone());
        let has_static_keys = !args.access_key.is_empty() || !args.secret_key.is_empty();

        let config = if args.use_aws {
            let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
            if has_static_keys {
                loader = loader.credentials_provider(static_credentials(args));
            }
            let shared = loader.load().await;

            let mut builder =
                aws_sdk_s3::config::Builder::from(&shared).force_path_style(args.use_path_style);
            if !args.endpoint.is_empty() {
                builder = builder.endpoint_url(&args.endpoint);
            }
            builder.build()
        } else {
            let mut builder = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(region)
                .credentials_provider(static_credentials(args))
                .force_path_style(args.use_path_style);
            if !args.endpoint.is_empty() {
                builder = builder.endpoint_url(&args.endpoint);
            }
            builder.build()
        };

        Client::from_conf(config)
    }

    /// Probe for the bucket and create it when the probe says it is missing.
    async fn ensure_bucket(&self, region: &str) -> Result<()> {
        let probe = self.client.head_bucket().bucket(&self.bucket).send().await;
        let err = match probe {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };

        let missing = err.as_service_error().is_some_and(|e| e.is_not_found());
        if !missing {
            warn!(bucket = %self.bucket, error = %err, "bucket probe failed, continuing");
            return Ok(());
        }

        info!(bucket = %self.bucket, region, "bucket not found, creating it");
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        request.send().await.map_err(|e| {
            Error::provider_init(format!("failed to create bucket {}", self.bucket), e)
        })?;
        Ok(())
    }
}

fn static_credentials(args: &S3Config) -> Credentials {
    Credentials::new(
        args.access_key.clone(),
        args.secret_key.expose().to_string(),
        None,
        None,
        CREDENTIALS_SOURCE,
    )
}

/// Convert an SDK timestamp, falling back to the Unix epoch.
fn to_utc(timestamp: Option<&SdkDateTime>) -> DateTime<Utc> {
    timestamp
        .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
        .unwrap_or_default()
}

/// Classify an SDK failure, `is_missing` decides on the service error.
fn map_sdk_error<E, R>(key: &str, err: SdkError<E, R>, is_missing: impl Fn(&E) -> bool) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    if err.as_service_error().is_some_and(is_missing) {
        Error::NotFound(key.to_string())
    } else {
        Error::backend(provider_type::AWS_S3, err)
    }
}

fn never_missing<E>(_: &E) -> bool {
    false
}

#[async_trait]
impl StorageProvider for S3Storage {
    fn provider_type(&self) -> &'static str {
        provider_type::AWS_S3
    }

    async fn save(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let key = self.prefix.key(key);
        debug!(bucket = %self.bucket, %key, size = data.len(), "put_object");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| map_sdk_error(&key, e, never_missing))?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        let key = self.prefix.key(key);
        debug!(bucket = %self.bucket, %key, "get_object");

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| map_sdk_error(&key, e, |e| e.is_no_such_key()))?;

        // Consuming the body releases the connection on success and on error.
        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::backend(provider_type::AWS_S3, e))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self.stat(key).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn stat(&self, key: &str) -> Result<ObjectState> {
        let key = self.prefix.key(key);
        debug!(bucket = %self.bucket, %key, "head_object");

        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| map_sdk_error(&key, e, |e| e.is_not_found()))?;

        let size = response
            .content_length()
            .and_then(|len| u64::try_from(len).ok())
            .unwrap_or(0);
        Ok(ObjectState::new(size, to_utc(response.last_modified())))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ListedEntry>> {
        let scope = self.prefix.scope(prefix);
        debug!(bucket = %self.bucket, scan = scope.scan_prefix(), "list_objects_v2");

        let mut entries = Vec::new();
        let mut continuation_token: Option<String> = None;
        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(scope.scan_prefix())
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| map_sdk_error(scope.scan_prefix(), e, never_missing))?;

            entries.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter_map(|key| scope.object_entry(key)),
            );

            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(entries)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = self.prefix.key(key);
        debug!(bucket = %self.bucket, %key, "delete_object");

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| map_sdk_error(&key, e, never_missing))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::operation::get_object::GetObjectError;
    use aws_sdk_s3::operation::head_object::HeadObjectError;
    use aws_sdk_s3::types::error::{InvalidObjectState, NoSuchKey, NotFound};
    use cloudkit_common::Secret;

    fn offline_client() -> Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("ak", "sk", None, None, "test"))
            .endpoint_url("http://127.0.0.1:9")
            .build();
        Client::from_conf(config)
    }

    #[test]
    fn test_with_client_normalizes_prefix() {
        let storage = S3Storage::with_client(offline_client(), "my-bucket", "/data");
        assert_eq!(storage.bucket(), "my-bucket");
        assert_eq!(storage.prefix().as_str(), "data/");
        assert_eq!(storage.provider_type(), "aws_s3");
    }

    #[tokio::test]
    async fn test_connect_rejects_missing_region() {
        let args = S3Config {
            bucket: "my-bucket".to_string(),
            secret_key: Secret::from("sk"),
            ..Default::default()
        };
        let err = S3Storage::connect(&args).await.err().unwrap();
        assert_eq!(err.reason(), "argument invalid");
        assert!(err.to_string().contains("region"));
    }

    #[tokio::test]
    async fn test_from_config_requires_section() {
        let err = S3Storage::from_config(&StorageConfig::default())
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("can't find S3 argument"));
    }

    #[test]
    fn test_missing_object_is_not_found() {
        let err = SdkError::<GetObjectError, ()>::service_error(
            GetObjectError::NoSuchKey(NoSuchKey::builder().build()),
            (),
        );
        let mapped = map_sdk_error("data/a.txt", err, |e| e.is_no_such_key());
        assert!(mapped.is_not_found());
        assert_eq!(mapped.detail(), Some("data/a.txt"));

        let err = SdkError::<HeadObjectError, ()>::service_error(
            HeadObjectError::NotFound(NotFound::builder().build()),
            (),
        );
        let mapped = map_sdk_error("data/a.txt", err, |e| e.is_not_found());
        assert!(mapped.is_not_found());
    }

    #[test]
    fn test_other_failures_are_backend_errors() {
        let err = SdkError::<GetObjectError, ()>::service_error(
            GetObjectError::InvalidObjectState(InvalidObjectState::builder().build()),
            (),
        );
        let mapped = map_sdk_error("a.txt", err, |e| e.is_no_such_key());
        assert!(!mapped.is_not_found());
        assert_eq!(mapped.reason(), "backend error");
        assert!(mapped.to_string().starts_with("aws_s3 error:"));

        let err = SdkError::<GetObjectError, ()>::timeout_error("connect timed out");
        let mapped = map_sdk_error("a.txt", err, |e| e.is_no_such_key());
        assert_eq!(mapped.reason(), "backend error");

        let err = SdkError::<HeadObjectError, ()>::service_error(
            HeadObjectError::NotFound(NotFound::builder().build()),
            (),
        );
        let mapped = map_sdk_error("a.txt", err, never_missing);
        assert_eq!(mapped.reason(), "backend error");
    }

    #[test]
    fn test_to_utc_defaults_to_epoch() {
        assert_eq!(to_utc(None).timestamp(), 0);
        let ts = SdkDateTime::from_secs(1_700_000_000);
        assert_eq!(to_utc(Some(&ts)).timestamp(), 1_700_000_000);
    }
}
