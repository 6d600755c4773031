//! Durable object store for rendered assets.
//!
//! The durable tier stores the asset bytes themselves (the fast tier
//! only stores URLs). Objects are written as `<cache-path>.<extension>`
//! and discovered by prefix, so a lookup does not need to know which
//! output format produced the entry.

use std::path::PathBuf;

use tracing::debug;

use crate::cache::{BoxFuture, StoreError};

/// Prefix-addressed object store holding rendered assets.
pub trait DurableStore: Send + Sync {
    /// Locate an object whose key starts with `prefix`, returning its
    /// public URL if one exists.
    fn find(&self, prefix: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>>;

    /// Store `bytes` under `key` and return the public URL of the
    /// stored object.
    fn put(&self, key: &str, bytes: Vec<u8>) -> BoxFuture<'_, Result<String, StoreError>>;
}

/// Filesystem-backed durable store.
///
/// Objects live under `root` mirroring their cache paths; `public_base`
/// is the URL prefix under which the root is served.
pub struct FsDurableStore {
    root: PathBuf,
    public_base: String,
}

impl FsDurableStore {
    /// Open (creating if necessary) a store rooted at `root`, served
    /// under `public_base`.
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base: public_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

impl DurableStore for FsDurableStore {
    fn find(&self, prefix: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        let prefix = prefix.to_string();
        Box::pin(async move {
            // Cache paths are version/sanitized-id/hex-digest, so the
            // glob pattern contains no metacharacters of its own.
            let pattern = self.root.join(format!("{prefix}*"));
            let pattern = pattern
                .to_str()
                .ok_or_else(|| StoreError::Backend("non-UTF-8 store root".to_string()))?;

            let first = glob::glob(pattern)
                .map_err(|e| StoreError::Backend(format!("bad glob pattern: {e}")))?
                .filter_map(Result::ok)
                .find(|path| path.is_file());

            match first {
                Some(path) => {
                    let relative = path
                        .strip_prefix(&self.root)
                        .map_err(|e| StoreError::Backend(format!("path outside root: {e}")))?;
                    let key = relative.to_string_lossy().replace('\\', "/");
                    debug!(%prefix, %key, "durable store hit");
                    Ok(Some(self.url_for(&key)))
                }
                None => Ok(None),
            }
        })
    }

    fn put(&self, key: &str, bytes: Vec<u8>) -> BoxFuture<'_, Result<String, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let path = self.root.join(&key);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, bytes).await?;
            Ok(self.url_for(&key))
        })
    }
}
