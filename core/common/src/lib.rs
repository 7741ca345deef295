//! Common types shared by the CloudKit storage crates.
//!
//! This crate holds the error taxonomy, the per-provider configuration
//! value types and the key-prefix rules every backend applies, so that
//! callers see identical relative key semantics regardless of provider.

pub mod config;
pub mod error;
pub mod path;
pub mod types;

pub use config::{
    AliyunOssConfig, AzureBlobConfig, GoogleStorageConfig, HuaweiObsConfig, LocalConfig,
    ProviderArgs, S3Config, StorageConfig, TencentCosConfig,
};
pub use error::{BoxError, Error, Result};
pub use path::{KeyPrefix, ListScope};
pub use types::{ListedEntry, ObjectState, Secret};
