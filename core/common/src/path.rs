//! Key prefix normalization shared by every backend.
//!
//! A handle may be bound to a root (a filesystem directory or a key prefix
//! inside a bucket). Keys passed to the storage operations are always
//! relative to that root, and `list` results are relative to the listed
//! prefix rather than to the root.

use crate::types::ListedEntry;

/// Normalized key prefix of a storage handle.
///
/// Invariant: either empty, or without a leading slash and ending in
/// exactly one slash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPrefix(String);

impl KeyPrefix {
    /// Normalize a configured root.
    pub fn new(root: &str) -> Self {
        let trimmed = root.trim_start_matches('/').trim_end_matches('/');
        if trimmed.is_empty() {
            Self(String::new())
        } else {
            Self(format!("{}/", trimmed))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Effective object key for `key`.
    pub fn key(&self, key: &str) -> String {
        format!("{}{}", self.0, key.trim_start_matches('/'))
    }

    /// Scope for listing everything under `prefix`.
    pub fn scope(&self, prefix: &str) -> ListScope {
        let mut scan = self.key(prefix);
        // An empty scan prefix means the whole bucket, not "/".
        if !scan.is_empty() && !scan.ends_with('/') {
            scan.push('/');
        }
        ListScope { scan }
    }
}

/// A resolved `list` query against a flat object namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListScope {
    scan: String,
}

impl ListScope {
    /// Prefix to hand to the vendor list API.
    pub fn scan_prefix(&self) -> &str {
        &self.scan
    }

    /// Path of `full_key` relative to the scan prefix.
    ///
    /// Returns `None` for the scan prefix itself, for keys outside the
    /// scope and for keys that become empty once the prefix is stripped.
    pub fn relative<'a>(&self, full_key: &'a str) -> Option<&'a str> {
        if full_key == self.scan {
            return None;
        }
        let rest = full_key.strip_prefix(self.scan.as_str())?;
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    /// Listing entry for an object key returned by a flat namespace.
    ///
    /// Directory markers (keys ending in `/`) are dropped.
    pub fn object_entry(&self, full_key: &str) -> Option<ListedEntry> {
        if full_key.ends_with('/') {
            return None;
        }
        self.relative(full_key).map(ListedEntry::file)
    }
}
