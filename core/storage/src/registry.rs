//! Provider registry for dynamic provider resolution.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::provider::StorageProvider;
use cloudkit_common::{Error, Result, StorageConfig};

/// Future returned by a provider constructor.
pub type ProviderFuture = BoxFuture<'static, Result<Arc<dyn StorageProvider>>>;

/// Factory function type for creating providers.
pub type ProviderFactory = Arc<dyn Fn(StorageConfig) -> ProviderFuture + Send + Sync>;

/// Wrap a typed constructor into a [`ProviderFactory`].
pub fn provider_factory<F, Fut, P>(constructor: F) -> ProviderFactory
where
    F: Fn(StorageConfig) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<P>> + Send + 'static,
    P: StorageProvider + 'static,
{
    Arc::new(move |config: StorageConfig| {
        let pending = constructor(config);
        async move {
            let provider = pending.await?;
            Ok::<Arc<dyn StorageProvider>, Error>(Arc::new(provider))
        }
        .boxed()
    })
}

/// Registry for storage provider factories.
///
/// Maps provider names (several aliases may share one constructor) to
/// factories. The registry is a plain value owned by the application.
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a provider factory.
    ///
    /// # Preconditions
    /// - `name` must be unique within the registry
    ///
    /// # Errors
    /// - `AlreadyExists` if the name is already registered
    pub fn register(&mut self, name: impl Into<String>, factory: ProviderFactory) -> Result<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(Error::AlreadyExists(format!(
                "Provider '{}' is already registered",
                name
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Register one factory under several names.
    ///
    /// Nothing is registered if any of the names is already taken.
    pub fn register_aliases(&mut self, names: &[&str], factory: ProviderFactory) -> Result<()> {
        if let Some(taken) = names.iter().find(|n| self.factories.contains_key(**n)) {
            return Err(Error::AlreadyExists(format!(
                "Provider '{}' is already registered",
                taken
            )));
        }
        for name in names {
            self.factories.insert((*name).to_string(), factory.clone());
        }
        Ok(())
    }

    /// Resolve a provider by name and configuration.
    ///
    /// The constructor's result is returned as is; a failed construction
    /// leaves the registry untouched.
    ///
    /// # Errors
    /// - `ProviderNotFound` if no factory is registered under `name`
    /// - Whatever the constructor reports
    pub async fn resolve(
        &self,
        name: &str,
        config: StorageConfig,
    ) -> Result<Arc<dyn StorageProvider>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            Error::ProviderNotFound(format!("[ {} ] is not in the provider list", name))
        })?;
        debug!(provider = name, "resolving storage provider");
        factory(config).await
    }

    /// Resolve a provider from a JSON configuration value.
    pub async fn resolve_value(
        &self,
        name: &str,
        config: Value,
    ) -> Result<Arc<dyn StorageProvider>> {
        if !self.has_provider(name) {
            return Err(Error::ProviderNotFound(format!(
                "[ {} ] is not in the provider list",
                name
            )));
        }
        self.resolve(name, StorageConfig::from_value(config)?).await
    }

    /// Get list of registered provider names.
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider is registered.
    pub fn has_provider(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider names accepted by [`create_default_registry`].
pub const LOCAL_ALIASES: &[&str] = &["local", "local_file"];
pub const S3_ALIASES: &[&str] = &["s3", "aws_s3"];
pub const AZURE_BLOB_ALIASES: &[&str] = &["azure", "azure_blob"];
pub const ALIYUN_OSS_ALIASES: &[&str] = &["aliyun", "aliyun-oss", "aliyun_oss"];
pub const TENCENT_COS_ALIASES: &[&str] = &["tencent", "tencent_cos", "tencent-cos"];
pub const GCS_ALIASES: &[&str] = &["gcs", "google-storage"];
pub const HUAWEI_OBS_ALIASES: &[&str] = &["huawei", "huawei-obs", "huawei_obs"];

/// Create a registry with every built-in provider.
pub fn create_default_registry() -> Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();

    registry.register_aliases(
        LOCAL_ALIASES,
        provider_factory(|config| async move { crate::local::LocalStorage::from_config(&config) }),
    )?;
    registry.register_aliases(
        S3_ALIASES,
        provider_factory(|config| async move { crate::s3::S3Storage::from_config(&config).await }),
    )?;
    registry.register_aliases(
        AZURE_BLOB_ALIASES,
        provider_factory(|config| async move {
            crate::azure::AzureBlobStorage::from_config(&config)
        }),
    )?;
    registry.register_aliases(
        ALIYUN_OSS_ALIASES,
        provider_factory(|config| async move {
            crate::aliyun::AliyunOssStorage::from_config(&config)
        }),
    )?;
    registry.register_aliases(
        TENCENT_COS_ALIASES,
        provider_factory(|config| async move {
            crate::tencent::TencentCosStorage::from_config(&config)
        }),
    )?;
    registry.register_aliases(
        GCS_ALIASES,
        provider_factory(|config| async move { crate::gcs::GcsStorage::from_config(&config) }),
    )?;
    registry.register_aliases(
        HUAWEI_OBS_ALIASES,
        provider_factory(|config| async move {
            crate::huawei::HuaweiObsStorage::from_config(&config)
        }),
    )?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;
    use cloudkit_common::{LocalConfig, S3Config};
    use serde_json::json;
    use tempfile::TempDir;

    fn memory_factory() -> ProviderFactory {
        provider_factory(|_| async { Ok::<_, Error>(MemoryStorage::new()) })
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let mut registry = ProviderRegistry::new();
        registry.register("test", memory_factory()).unwrap();

        let provider = registry.resolve("test", StorageConfig::default()).await.unwrap();
        assert_eq!(provider.provider_type(), "memory");
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ProviderRegistry::new();
        registry.register("test", memory_factory()).unwrap();

        let result = registry.register("test", memory_factory());
        assert!(matches!(result, Err(Error::AlreadyExists(_))));
    }

    #[test]
    fn test_alias_collision_registers_nothing() {
        let mut registry = ProviderRegistry::new();
        registry.register("b", memory_factory()).unwrap();

        let result = registry.register_aliases(&["a", "b"], memory_factory());
        assert!(result.is_err());
        assert!(!registry.has_provider("a"));
    }

    #[tokio::test]
    async fn test_resolve_unknown_fails() {
        let registry = ProviderRegistry::new();
        let err = registry
            .resolve("unknown", StorageConfig::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.reason(), "provider not found");
        assert!(err.to_string().contains("unknown"));
    }

    #[tokio::test]
    async fn test_resolve_is_case_sensitive() {
        let registry = create_default_registry().unwrap();
        let err = registry
            .resolve("LOCAL", StorageConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::ProviderNotFound(_)));
    }

    #[test]
    fn test_default_registry_aliases() {
        let registry = create_default_registry().unwrap();
        let all = [
            LOCAL_ALIASES,
            S3_ALIASES,
            AZURE_BLOB_ALIASES,
            ALIYUN_OSS_ALIASES,
            TENCENT_COS_ALIASES,
            GCS_ALIASES,
            HUAWEI_OBS_ALIASES,
        ];
        for name in all.iter().flat_map(|aliases| aliases.iter()) {
            assert!(registry.has_provider(name), "missing alias {}", name);
        }
        assert_eq!(registry.providers().len(), 17);
    }

    #[tokio::test]
    async fn test_resolve_local_by_alias() {
        let temp = TempDir::new().unwrap();
        let registry = create_default_registry().unwrap();
        let config = StorageConfig::from(LocalConfig {
            path: temp.path().join("store"),
        });

        let provider = registry.resolve("local_file", config).await.unwrap();
        assert_eq!(provider.provider_type(), "local");
        provider.save("k.txt", b"v".to_vec()).await.unwrap();
        assert!(provider.exists("k.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_value() {
        let temp = TempDir::new().unwrap();
        let registry = create_default_registry().unwrap();
        let root = temp.path().join("json-root");

        let provider = registry
            .resolve_value("local", json!({ "local": { "path": root } }))
            .await
            .unwrap();
        assert_eq!(provider.provider_type(), "local");
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_mismatched_section_is_argument_invalid() {
        let registry = create_default_registry().unwrap();
        let config = StorageConfig::from(S3Config {
            bucket: "b".to_string(),
            region: "us-east-1".to_string(),
            ..Default::default()
        });

        for name in ["local", "azure", "aliyun", "tencent", "gcs", "huawei"] {
            let err = registry.resolve(name, config.clone()).await.err().unwrap();
            assert_eq!(err.reason(), "argument invalid", "provider {}", name);
        }
    }

    #[tokio::test]
    async fn test_failed_construction_leaves_registry_usable() {
        let temp = TempDir::new().unwrap();
        let registry = create_default_registry().unwrap();

        let bad = registry.resolve("local", StorageConfig::from(LocalConfig::default())).await;
        assert!(bad.is_err());

        let good = registry
            .resolve(
                "local",
                StorageConfig::from(LocalConfig {
                    path: temp.path().to_path_buf(),
                }),
            )
            .await;
        assert!(good.is_ok());
    }
}
