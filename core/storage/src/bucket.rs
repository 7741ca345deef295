//! Shared bucket client for the OpenDAL-backed providers.
//!
//! Azure Blob, Aliyun OSS, Tencent COS, Google Cloud Storage and Huawei OBS
//! all expose a flat key namespace through an OpenDAL [`Operator`]. This
//! client applies the key prefix rules on top of the operator and maps
//! OpenDAL errors into the common error type.

use opendal::layers::LoggingLayer;
use opendal::{Builder, EntryMode, ErrorKind, Operator};
use tracing::debug;

use cloudkit_common::{Error, KeyPrefix, ListedEntry, ObjectState, Result};

/// Operator bound to one bucket and key prefix.
#[derive(Clone)]
pub(crate) struct BucketClient {
    operator: Operator,
    prefix: KeyPrefix,
    provider: &'static str,
}

impl BucketClient {
    /// Build the operator for `builder`.
    ///
    /// # Errors
    /// - `ProviderInit` if the service configuration is rejected
    pub(crate) fn new<B: Builder>(
        provider: &'static str,
        builder: B,
        prefix: KeyPrefix,
    ) -> Result<Self> {
        let operator = Operator::new(builder)
            .map_err(|e| Error::provider_init(format!("failed to create {} client", provider), e))?
            .layer(LoggingLayer::default())
            .finish();

        Ok(Self::from_operator(provider, operator, prefix))
    }

    pub(crate) fn from_operator(
        provider: &'static str,
        operator: Operator,
        prefix: KeyPrefix,
    ) -> Self {
        Self {
            operator,
            prefix,
            provider,
        }
    }

    pub(crate) fn prefix(&self) -> &KeyPrefix {
        &self.prefix
    }

    pub(crate) async fn save(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let path = self.prefix.key(key);
        debug!(provider = self.provider, %path, size = data.len(), "save");
        self.operator
            .write(&path, data)
            .await
            .map_err(|e| map_error(self.provider, &path, e))?;
        Ok(())
    }

    pub(crate) async fn load(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.prefix.key(key);
        debug!(provider = self.provider, %path, "load");
        let buffer = self
            .operator
            .read(&path)
            .await
            .map_err(|e| map_error(self.provider, &path, e))?;
        Ok(buffer.to_vec())
    }

    pub(crate) async fn exists(&self, key: &str) -> Result<bool> {
        match self.stat(key).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub(crate) async fn stat(&self, key: &str) -> Result<ObjectState> {
        let path = self.prefix.key(key);
        debug!(provider = self.provider, %path, "stat");
        let metadata = self
            .operator
            .stat(&path)
            .await
            .map_err(|e| map_error(self.provider, &path, e))?;

        Ok(ObjectState::new(
            metadata.content_length(),
            metadata.last_modified().unwrap_or_default(),
        ))
    }

    pub(crate) async fn list(&self, prefix: &str) -> Result<Vec<ListedEntry>> {
        let scope = self.prefix.scope(prefix);
        let scan = match scope.scan_prefix() {
            "" => "/",
            scan => scan,
        };
        debug!(provider = self.provider, scan, "list");

        let entries = match self.operator.list_with(scan).recursive(true).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(map_error(self.provider, scan, err)),
        };

        Ok(entries
            .iter()
            .filter(|entry| entry.metadata().mode() != EntryMode::DIR)
            .filter_map(|entry| scope.object_entry(entry.path()))
            .collect())
    }

    pub(crate) async fn delete(&self, key: &str) -> Result<()> {
        let path = self.prefix.key(key);
        debug!(provider = self.provider, %path, "delete");
        self.operator
            .delete(&path)
            .await
            .map_err(|e| map_error(self.provider, &path, e))
    }
}

/// Classify an OpenDAL error: missing objects become `NotFound`.
pub(crate) fn map_error(provider: &'static str, path: &str, err: opendal::Error) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::NotFound(path.to_string())
    } else {
        Error::backend(provider, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opendal::services::Memory;

    fn memory_client(root: &str) -> BucketClient {
        let operator = Operator::new(Memory::default()).unwrap().finish();
        BucketClient::from_operator("memory", operator, KeyPrefix::new(root))
    }

    async fn sorted_paths(client: &BucketClient, prefix: &str) -> Vec<String> {
        let mut paths: Vec<String> = client
            .list(prefix)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| {
                assert!(!entry.is_dir);
                entry.path
            })
            .collect();
        paths.sort();
        paths
    }

    async fn check_round_trip(client: &BucketClient) {
        client.save("a/b.txt", b"abc".to_vec()).await.unwrap();
        client.save("a/sub/c.txt", vec![1]).await.unwrap();
        client.save("top.txt", vec![2]).await.unwrap();

        assert_eq!(client.load("a/b.txt").await.unwrap(), b"abc");
        assert_eq!(client.stat("a/b.txt").await.unwrap().size, 3);
        assert!(client.exists("a/b.txt").await.unwrap());

        assert_eq!(sorted_paths(client, "a").await, vec!["b.txt", "sub/c.txt"]);
        assert_eq!(sorted_paths(client, "/a/").await, vec!["b.txt", "sub/c.txt"]);
        assert_eq!(
            sorted_paths(client, "").await,
            vec!["a/b.txt", "a/sub/c.txt", "top.txt"]
        );
        assert!(client.list("missing").await.unwrap().is_empty());

        assert!(!client.exists("missing.txt").await.unwrap());
        assert!(client.load("missing.txt").await.unwrap_err().is_not_found());
        assert!(client.stat("missing.txt").await.unwrap_err().is_not_found());
        client.delete("missing.txt").await.unwrap();

        client.delete("a/b.txt").await.unwrap();
        assert!(!client.exists("a/b.txt").await.unwrap());
        assert_eq!(sorted_paths(client, "a").await, vec!["sub/c.txt"]);
    }

    #[tokio::test]
    async fn test_round_trip_without_prefix() {
        check_round_trip(&memory_client("")).await;
    }

    #[tokio::test]
    async fn test_round_trip_with_prefix() {
        let client = memory_client("/tenant/");
        assert_eq!(client.prefix().as_str(), "tenant/");
        check_round_trip(&client).await;
    }

    #[tokio::test]
    async fn test_prefix_isolates_keys() {
        let operator = Operator::new(Memory::default()).unwrap().finish();
        let outer = BucketClient::from_operator("memory", operator.clone(), KeyPrefix::new(""));
        let inner = BucketClient::from_operator("memory", operator, KeyPrefix::new("tenant"));

        inner.save("k.txt", vec![1]).await.unwrap();
        assert!(outer.exists("tenant/k.txt").await.unwrap());
        assert!(!outer.exists("k.txt").await.unwrap());
        assert_eq!(sorted_paths(&outer, "tenant").await, vec!["k.txt"]);
    }

    #[test]
    fn test_new_builds_operator() {
        let client =
            BucketClient::new("memory", Memory::default(), KeyPrefix::new("data")).unwrap();
        assert_eq!(client.prefix().as_str(), "data/");
    }

    #[test]
    fn test_map_error_not_found() {
        let err = opendal::Error::new(ErrorKind::NotFound, "object missing");
        let mapped = map_error("gcs", "a/b.txt", err);
        assert!(mapped.is_not_found());
        assert_eq!(mapped.detail(), Some("a/b.txt"));
    }

    #[test]
    fn test_map_error_keeps_other_failures() {
        let err = opendal::Error::new(ErrorKind::PermissionDenied, "forbidden");
        let mapped = map_error("huawei_obs", "a/b.txt", err);
        assert!(!mapped.is_not_found());
        assert_eq!(mapped.reason(), "backend error");
        assert!(mapped.to_string().starts_with("huawei_obs error:"));
    }
}
