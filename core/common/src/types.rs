//! Common types used throughout CloudKit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Canonical provider type identifiers reported by `provider_type()`.
pub mod provider_type {
    pub const LOCAL: &str = "local";
    pub const AWS_S3: &str = "aws_s3";
    pub const AZURE_BLOB: &str = "azure_blob";
    pub const ALIYUN_OSS: &str = "aliyun_oss";
    pub const TENCENT_COS: &str = "tencent_cos";
    pub const GCS: &str = "gcs";
    pub const HUAWEI_OBS: &str = "huawei_obs";
    pub const MEMORY: &str = "memory";
}

/// Size and modification time of a stored object.
///
/// Fields are zero-valued (0 bytes, Unix epoch) when the backend does not
/// report them or reports something unparsable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectState {
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
}

impl ObjectState {
    pub fn new(size: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            size,
            last_modified,
        }
    }
}

/// One entry returned by `list`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListedEntry {
    /// Path relative to the listed prefix, never empty.
    pub path: String,
    /// Whether this entry is a directory.
    pub is_dir: bool,
}

impl ListedEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }
}

/// Credential string that is redacted in debug output and zeroized on drop.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "Secret(<empty>)")
        } else {
            write!(f, "Secret([REDACTED])")
        }
    }
}
