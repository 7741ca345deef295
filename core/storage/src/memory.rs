//! In-memory storage provider for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::provider::{provider_type, ListedEntry, ObjectState, StorageProvider};
use cloudkit_common::{Error, KeyPrefix, Result};

/// In-memory stored object.
#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

/// In-memory storage provider.
///
/// Behaves like a flat object store. Useful for testing and development;
/// all data is lost on drop.
pub struct MemoryStorage {
    prefix: KeyPrefix,
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStorage {
    /// Create a new empty memory provider.
    pub fn new() -> Self {
        Self::with_prefix("")
    }

    /// Create an empty memory provider whose keys live under `root`.
    pub fn with_prefix(root: &str) -> Self {
        Self {
            prefix: KeyPrefix::new(root),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorage {
    fn provider_type(&self) -> &'static str {
        provider_type::MEMORY
    }

    async fn save(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let object = StoredObject {
            data,
            modified: Utc::now(),
        };
        self.objects.write().await.insert(self.prefix.key(key), object);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        let key = self.prefix.key(key);
        match self.objects.read().await.get(&key) {
            Some(object) => Ok(object.data.clone()),
            None => Err(Error::NotFound(key)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.read().await.contains_key(&self.prefix.key(key)))
    }

    async fn stat(&self, key: &str) -> Result<ObjectState> {
        let key = self.prefix.key(key);
        match self.objects.read().await.get(&key) {
            Some(object) => Ok(ObjectState::new(object.data.len() as u64, object.modified)),
            None => Err(Error::NotFound(key)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ListedEntry>> {
        let scope = self.prefix.scope(prefix);
        let objects = self.objects.read().await;

        Ok(objects
            .range(scope.scan_prefix().to_string()..)
            .take_while(|(key, _)| key.starts_with(scope.scan_prefix()))
            .filter_map(|(key, _)| scope.object_entry(key))
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.write().await.remove(&self.prefix.key(key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_save_load() {
        let storage = MemoryStorage::new();
        let data = b"Hello, World!".to_vec();

        storage.save("test.txt", data.clone()).await.unwrap();
        let loaded = storage.load("test.txt").await.unwrap();

        assert_eq!(loaded, data);
        assert_eq!(storage.stat("test.txt").await.unwrap().size, 13);
    }

    #[tokio::test]
    async fn test_memory_missing_key() {
        let storage = MemoryStorage::new();

        assert!(!storage.exists("nope").await.unwrap());
        assert!(storage.load("nope").await.unwrap_err().is_not_found());
        assert!(storage.stat("nope").await.unwrap_err().is_not_found());
        storage.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_list_is_relative_and_flat() {
        let storage = MemoryStorage::with_prefix("/tenant/");

        storage.save("a/b.txt", vec![1]).await.unwrap();
        storage.save("a/c/d.txt", vec![2]).await.unwrap();
        storage.save("a/", vec![]).await.unwrap();
        storage.save("ab.txt", vec![3]).await.unwrap();

        let entries = storage.list("a").await.unwrap();
        assert_eq!(
            entries,
            vec![ListedEntry::file("b.txt"), ListedEntry::file("c/d.txt")]
        );
    }

    #[tokio::test]
    async fn test_memory_list_whole_namespace() {
        let storage = MemoryStorage::new();

        storage.save("x.txt", vec![1]).await.unwrap();
        storage.save("y/z.txt", vec![2]).await.unwrap();

        let entries = storage.list("").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(storage.len().await, 2);
    }
}
