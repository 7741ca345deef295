//! Storage provider abstraction for CloudKit.
//!
//! This crate provides one trait-based object storage contract for the
//! local filesystem and several cloud blob stores, and a provider registry
//! that resolves a backend by name at runtime.
//!
//! # Design Principles
//! - Uniform semantics: every backend applies the same key prefix rules
//! - Thin adapters: each backend passes straight through to its vendor SDK
//! - Async operations: all I/O operations are async
//! - Unified error semantics: missing objects are `NotFound` on every backend

mod bucket;

pub mod aliyun;
pub mod azure;
pub mod gcs;
pub mod huawei;
pub mod local;
pub mod memory;
pub mod provider;
pub mod registry;
pub mod s3;
pub mod tencent;

pub use aliyun::AliyunOssStorage;
pub use azure::AzureBlobStorage;
pub use gcs::GcsStorage;
pub use huawei::HuaweiObsStorage;
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use provider::{provider_type, ListedEntry, ObjectState, StorageProvider};
pub use registry::{create_default_registry, provider_factory, ProviderFactory, ProviderRegistry};
pub use s3::S3Storage;
pub use tencent::TencentCosStorage;
