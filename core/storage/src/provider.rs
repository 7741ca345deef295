//! Storage provider trait definition.

use async_trait::async_trait;

use cloudkit_common::Result;

pub use cloudkit_common::types::provider_type;
pub use cloudkit_common::{ListedEntry, ObjectState};

/// Storage contract implemented by every backend.
///
/// Keys are relative to the handle's root or key prefix. Handles hold only
/// immutable state and may be used concurrently from several tasks.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Canonical provider identifier (e.g., "local", "aws_s3").
    ///
    /// Meant for logging and introspection, not for dispatch.
    fn provider_type(&self) -> &'static str;

    /// Write `data` to `key`, replacing any existing object.
    ///
    /// # Postconditions
    /// - A following `load(key)` returns exactly `data`
    ///
    /// # Errors
    /// - Network/I/O errors
    async fn save(&self, key: &str, data: Vec<u8>) -> Result<()>;

    /// Read the full content of `key`.
    ///
    /// # Errors
    /// - `NotFound` if the object does not exist
    /// - Network/I/O errors
    async fn load(&self, key: &str) -> Result<Vec<u8>>;

    /// Check if `key` exists.
    ///
    /// A missing object is `Ok(false)`, never an error.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Get size and modification time of `key`.
    ///
    /// # Errors
    /// - `NotFound` if the object does not exist
    async fn stat(&self, key: &str) -> Result<ObjectState>;

    /// List everything under `prefix`.
    ///
    /// Paths are relative to `prefix`. The prefix itself is never returned
    /// and no returned path is empty. Order is backend-defined.
    async fn list(&self, prefix: &str) -> Result<Vec<ListedEntry>>;

    /// Delete `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}
