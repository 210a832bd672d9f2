//! Disk-backed memoization for generation calls.
//!
//! Every remote generation step is wrapped in [`DiskCache::get_or_compute`]:
//! the call's inputs become a [`CacheKey`], the key is digested together with
//! the prompt version, and the result is stored as pretty-printed JSON under
//! `<root>/<namespace>/<digest>.json`. Bumping the prompt version therefore
//! invalidates every cached response at once.
//!
//! The cache never turns a storage problem into a pipeline failure: keys that
//! cannot be serialized bypass the cache, unreadable or corrupt entries are
//! recomputed, and write failures are logged and swallowed.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Named, order-independent call arguments.
///
/// Arguments are kept sorted by name so the digest does not depend on the
/// order the call site lists them in.
#[derive(Debug, Clone, Default)]
pub struct CacheKey {
    args: BTreeMap<String, Value>,
    poisoned: bool,
}

impl CacheKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named argument. An argument that cannot be represented as JSON
    /// poisons the key; a poisoned key disables caching for the call instead
    /// of failing it.
    pub fn arg(mut self, name: &str, value: &impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.args.insert(name.to_string(), json);
            }
            Err(error) => {
                warn!("cache key argument '{name}' is not serializable: {error}");
                self.poisoned = true;
            }
        }
        self
    }

    fn digest(&self, version: &str) -> Option<String> {
        if self.poisoned {
            return None;
        }
        let payload = serde_json::to_string(&self.args).ok()?;
        let mut hasher = Sha256::new();
        hasher.update(version.as_bytes());
        hasher.update(b"\n");
        hasher.update(payload.as_bytes());
        let hex = format!("{:x}", hasher.finalize());
        Some(hex[..32].to_string())
    }
}

pub struct DiskCache {
    root: PathBuf,
    version: String,
}

impl DiskCache {
    /// `version` is folded into every digest; see the module docs.
    pub fn new(root: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            version: version.into(),
        }
    }

    /// Returns the cached value for `key`, or runs `compute` and caches its
    /// result. A `None` result is returned but never cached, so transient
    /// empty answers stay retryable. Errors from `compute` pass through
    /// untouched.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        namespace: &str,
        key: &CacheKey,
        compute: F,
    ) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let Some(digest) = key.digest(&self.version) else {
            debug!("cache bypass in '{namespace}': key not serializable");
            return compute().await;
        };
        let path = self.root.join(namespace).join(format!("{digest}.json"));

        if let Some(hit) = self.read_entry::<T>(&path).await {
            debug!("cache hit in '{namespace}' for {digest}");
            return Ok(Some(hit));
        }

        debug!("cache miss in '{namespace}' for {digest}");
        let value = compute().await?;
        if let Some(ref computed) = value {
            self.write_entry(&path, computed).await;
        }
        Ok(value)
    }

    async fn read_entry<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
            Err(error) => {
                warn!("failed to read cache entry {}: {error}", path.display());
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(error) => {
                // Corrupt entry: recompute and let the fresh write replace it.
                warn!("discarding corrupt cache entry {}: {error}", path.display());
                None
            }
        }
    }

    async fn write_entry<T: Serialize>(&self, path: &Path, value: &T) {
        let payload = match serde_json::to_string_pretty(value) {
            Ok(payload) => payload,
            Err(error) => {
                warn!("failed to serialize cache entry {}: {error}", path.display());
                return;
            }
        };
        if let Some(parent) = path.parent() {
            if let Err(error) = tokio::fs::create_dir_all(parent).await {
                warn!("failed to create cache directory {}: {error}", parent.display());
                return;
            }
        }
        if let Err(error) = tokio::fs::write(path, payload).await {
            warn!("failed to write cache entry {}: {error}", path.display());
        }
    }
}
