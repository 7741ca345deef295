//! Local filesystem storage provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::provider::{provider_type, ListedEntry, ObjectState, StorageProvider};
use cloudkit_common::{Error, LocalConfig, Result, StorageConfig};

/// Local filesystem storage provider.
///
/// Stores objects as files under a root directory. Directories are
/// implicit in keys and show up in listings with `is_dir = true`.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a new local provider with the given root directory.
    ///
    /// # Postconditions
    /// - Root directory exists (created recursively if missing)
    ///
    /// # Errors
    /// - `ArgumentInvalid` if the root is empty
    /// - `ProviderInit` if the root cannot be created
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.as_os_str().is_empty() {
            return Err(Error::ArgumentInvalid("Local: path cannot be empty".to_string()));
        }

        // Create root if it doesn't exist (sync for constructor)
        std::fs::create_dir_all(&root)
            .map_err(|e| Error::provider_init("failed to create storage path", e))?;

        info!(root = %root.display(), "local storage ready");
        Ok(Self { root })
    }

    /// Create a local provider from its config section.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let args = config.args::<LocalConfig>()?;
        Self::new(&args.path)
    }

    /// Root directory of this handle.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert a key to a filesystem path below the root.
    fn to_fs_path(&self, key: &str) -> Result<PathBuf> {
        let mut fs_path = self.root.clone();
        for component in Path::new(key).components() {
            match component {
                Component::Normal(part) => fs_path.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(Error::ArgumentInvalid(format!(
                        "key escapes storage root: {}",
                        key
                    )));
                }
            }
        }
        Ok(fs_path)
    }
}

/// Whether `err` means nothing is stored at the path.
///
/// A key that runs through an existing file fails with `NotADirectory`.
fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Turn a missing file into `NotFound`, keep every other I/O error.
fn map_io(err: io::Error, key: &str) -> Error {
    if is_missing(&err) {
        Error::NotFound(key.to_string())
    } else {
        Error::Io(err)
    }
}

/// `/`-joined path of `path` relative to `base`.
fn relative_key(base: &Path, path: &Path) -> Option<String> {
    let rest = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rest
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    fn provider_type(&self) -> &'static str {
        provider_type::LOCAL
    }

    async fn save(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let fs_path = self.to_fs_path(key)?;
        debug!(path = %fs_path.display(), size = data.len(), "save");

        if let Some(parent) = fs_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&fs_path, &data).await?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        let fs_path = self.to_fs_path(key)?;
        debug!(path = %fs_path.display(), "load");
        fs::read(&fs_path).await.map_err(|e| map_io(e, key))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let fs_path = self.to_fs_path(key)?;
        match fs::metadata(&fs_path).await {
            Ok(_) => Ok(true),
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn stat(&self, key: &str) -> Result<ObjectState> {
        let fs_path = self.to_fs_path(key)?;
        let fs_meta = fs::metadata(&fs_path).await.map_err(|e| map_io(e, key))?;

        let last_modified: DateTime<Utc> = fs_meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_default();

        Ok(ObjectState::new(fs_meta.len(), last_modified))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ListedEntry>> {
        let base = self.to_fs_path(prefix)?;
        debug!(path = %base.display(), "list");

        match fs::metadata(&base).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(Vec::new()),
            Err(e) if is_missing(&e) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        }

        let mut results = Vec::new();
        let mut pending = vec![base.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let entry_path = entry.path();
                let is_dir = entry.file_type().await?.is_dir();

                let Some(path) = relative_key(&base, &entry_path) else {
                    continue;
                };
                if is_dir {
                    pending.push(entry_path);
                }
                results.push(ListedEntry { path, is_dir });
            }
        }

        Ok(results)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let fs_path = self.to_fs_path(key)?;
        debug!(path = %fs_path.display(), "delete");

        let fs_meta = match fs::symlink_metadata(&fs_path).await {
            Ok(meta) => meta,
            Err(e) if is_missing(&e) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        if fs_meta.is_dir() {
            fs::remove_dir_all(&fs_path).await?;
        } else {
            fs::remove_file(&fs_path).await?;
        }
        Ok(())
    }
}
