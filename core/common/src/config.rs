//! Per-provider configuration value types.
//!
//! A [`StorageConfig`] carries one optional argument struct per provider.
//! Exactly one is expected to be populated; the constructor of the
//! requested provider picks its own struct out with [`StorageConfig::args`]
//! and fails with `ArgumentInvalid` if it is absent or incomplete.

use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::Secret;

/// Argument struct of one provider inside a [`StorageConfig`].
pub trait ProviderArgs {
    /// Name used in error messages.
    const LABEL: &'static str;

    /// Pick this provider's arguments out of the config.
    fn select(config: &StorageConfig) -> Option<&Self>;

    /// Check that every required field is present.
    fn validate(&self) -> Result<()>;
}

/// Configuration handed to a provider constructor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub local: Option<LocalConfig>,
    pub s3: Option<S3Config>,
    pub azure_blob: Option<AzureBlobConfig>,
    pub aliyun_oss: Option<AliyunOssConfig>,
    pub tencent_cos: Option<TencentCosConfig>,
    pub google_storage: Option<GoogleStorageConfig>,
    pub huawei_obs: Option<HuaweiObsConfig>,
}

impl StorageConfig {
    /// Parse a config from a JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|e| Error::ArgumentInvalid(format!("invalid storage config: {}", e)))
    }

    /// Parse a config from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::ArgumentInvalid(format!("invalid storage config: {}", e)))
    }

    /// Get the validated arguments for provider `T`.
    ///
    /// # Errors
    /// - `ArgumentInvalid` if the arguments are absent or a required field is empty
    pub fn args<T: ProviderArgs>(&self) -> Result<&T> {
        let args = T::select(self).ok_or_else(|| {
            Error::ArgumentInvalid(format!(
                "can't find {} argument in storage config",
                T::LABEL
            ))
        })?;
        args.validate()?;
        Ok(args)
    }
}

/// Fail with `ArgumentInvalid` naming every empty required field.
fn require(label: &str, fields: &[(&str, bool)]) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, empty)| *empty)
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(Error::ArgumentInvalid(format!(
        "{}: {} cannot be empty",
        label,
        missing.join(", ")
    )))
}

/// Local filesystem arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Root directory; created if missing.
    pub path: PathBuf,
}

impl ProviderArgs for LocalConfig {
    const LABEL: &'static str = "Local";

    fn select(config: &StorageConfig) -> Option<&Self> {
        config.local.as_ref()
    }

    fn validate(&self) -> Result<()> {
        require(Self::LABEL, &[("path", self.path.as_os_str().is_empty())])
    }
}

/// AWS S3 (and S3-compatible) arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// Load credentials and settings from the AWS default chain.
    pub use_aws: bool,
    /// Custom endpoint for S3-compatible services.
    pub endpoint: String,
    pub use_path_style: bool,
    pub access_key: String,
    pub secret_key: Secret,
    pub bucket: String,
    pub region: String,
    /// Key prefix inside the bucket.
    pub prefix: String,
}

impl ProviderArgs for S3Config {
    const LABEL: &'static str = "S3";

    fn select(config: &StorageConfig) -> Option<&Self> {
        config.s3.as_ref()
    }

    fn validate(&self) -> Result<()> {
        require(
            Self::LABEL,
            &[
                ("bucket", self.bucket.is_empty()),
                ("region", self.region.is_empty()),
            ],
        )
    }
}

/// Azure Blob Storage arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AzureBlobConfig {
    pub connection_string: Secret,
    pub container_name: String,
    pub prefix: String,
}

impl ProviderArgs for AzureBlobConfig {
    const LABEL: &'static str = "Azure Blob";

    fn select(config: &StorageConfig) -> Option<&Self> {
        config.azure_blob.as_ref()
    }

    fn validate(&self) -> Result<()> {
        require(
            Self::LABEL,
            &[
                ("connection_string", self.connection_string.is_empty()),
                ("container_name", self.container_name.is_empty()),
            ],
        )
    }
}

/// Aliyun OSS arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AliyunOssConfig {
    /// Informational only; the endpoint selects the region.
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: Secret,
    /// Signature version. Only `v1` signing is available, so this must be
    /// empty or `v1`.
    pub auth_version: String,
    /// Key prefix inside the bucket.
    pub path: String,
    pub bucket: String,
}

impl ProviderArgs for AliyunOssConfig {
    const LABEL: &'static str = "Aliyun OSS";

    fn select(config: &StorageConfig) -> Option<&Self> {
        config.aliyun_oss.as_ref()
    }

    fn validate(&self) -> Result<()> {
        require(
            Self::LABEL,
            &[
                ("bucket", self.bucket.is_empty()),
                ("access_key", self.access_key.is_empty()),
                ("secret_key", self.secret_key.is_empty()),
                ("endpoint", self.endpoint.is_empty()),
            ],
        )?;
        match self.auth_version.as_str() {
            "" | "v1" => Ok(()),
            other => Err(Error::ArgumentInvalid(format!(
                "{}: unsupported auth_version '{}', only v1 signing is available",
                Self::LABEL,
                other
            ))),
        }
    }
}

/// Tencent COS arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TencentCosConfig {
    pub region: String,
    pub secret_id: String,
    pub secret_key: Secret,
    /// Bucket name including the APPID suffix.
    pub bucket: String,
    pub prefix: String,
}

impl TencentCosConfig {
    /// Service endpoint for the configured region.
    pub fn endpoint(&self) -> String {
        format!("https://cos.{}.myqcloud.com", self.region)
    }
}

impl ProviderArgs for TencentCosConfig {
    const LABEL: &'static str = "Tencent COS";

    fn select(config: &StorageConfig) -> Option<&Self> {
        config.tencent_cos.as_ref()
    }

    fn validate(&self) -> Result<()> {
        require(
            Self::LABEL,
            &[
                ("bucket", self.bucket.is_empty()),
                ("region", self.region.is_empty()),
                ("secret_id", self.secret_id.is_empty()),
                ("secret_key", self.secret_key.is_empty()),
            ],
        )
    }
}

/// Google Cloud Storage arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleStorageConfig {
    pub bucket: String,
    /// Base64-encoded service account JSON.
    pub credentials_b64: Secret,
    pub prefix: String,
}

impl ProviderArgs for GoogleStorageConfig {
    const LABEL: &'static str = "Google Cloud Storage";

    fn select(config: &StorageConfig) -> Option<&Self> {
        config.google_storage.as_ref()
    }

    fn validate(&self) -> Result<()> {
        require(
            Self::LABEL,
            &[
                ("bucket", self.bucket.is_empty()),
                ("credentials_b64", self.credentials_b64.is_empty()),
            ],
        )
    }
}

/// Huawei OBS arguments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HuaweiObsConfig {
    pub bucket: String,
    pub access_key: String,
    pub secret_key: Secret,
    /// Server endpoint, e.g. `https://obs.cn-north-4.myhuaweicloud.com`.
    pub server: String,
    pub prefix: String,
}

impl ProviderArgs for HuaweiObsConfig {
    const LABEL: &'static str = "Huawei OBS";

    fn select(config: &StorageConfig) -> Option<&Self> {
        config.huawei_obs.as_ref()
    }

    fn validate(&self) -> Result<()> {
        require(
            Self::LABEL,
            &[
                ("bucket", self.bucket.is_empty()),
                ("access_key", self.access_key.is_empty()),
                ("secret_key", self.secret_key.is_empty()),
                ("server", self.server.is_empty()),
            ],
        )
    }
}

impl From<LocalConfig> for StorageConfig {
    fn from(local: LocalConfig) -> Self {
        Self {
            local: Some(local),
            ..Default::default()
        }
    }
}

impl From<S3Config> for StorageConfig {
    fn from(s3: S3Config) -> Self {
        Self {
            s3: Some(s3),
            ..Default::default()
        }
    }
}

impl From<AzureBlobConfig> for StorageConfig {
    fn from(azure_blob: AzureBlobConfig) -> Self {
        Self {
            azure_blob: Some(azure_blob),
            ..Default::default()
        }
    }
}

impl From<AliyunOssConfig> for StorageConfig {
    fn from(aliyun_oss: AliyunOssConfig) -> Self {
        Self {
            aliyun_oss: Some(aliyun_oss),
            ..Default::default()
        }
    }
}

impl From<TencentCosConfig> for StorageConfig {
    fn from(tencent_cos: TencentCosConfig) -> Self {
        Self {
            tencent_cos: Some(tencent_cos),
            ..Default::default()
        }
    }
}

impl From<GoogleStorageConfig> for StorageConfig {
    fn from(google_storage: GoogleStorageConfig) -> Self {
        Self {
            google_storage: Some(google_storage),
            ..Default::default()
        }
    }
}

impl From<HuaweiObsConfig> for StorageConfig {
    fn from(huawei_obs: HuaweiObsConfig) -> Self {
        Self {
            huawei_obs: Some(huawei_obs),
            ..Default::default()
        }
    }
}
