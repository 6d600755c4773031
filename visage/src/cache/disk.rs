//! Filesystem-backed persistent URL store.
//!
//! The client's persistent tier: one small file per cache key under a
//! root directory, containing the resolved URL. Keys are hex digests, so
//! they are always safe as file names.

use std::path::{Path, PathBuf};

use tokio::fs;

use super::traits::{BoxFuture, StoreError, UrlStore};

/// Persistent URL store rooted at a directory.
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl UrlStore for DiskStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        let path = self.path_for(key);
        Box::pin(async move {
            match fs::read_to_string(&path).await {
                Ok(url) => Ok(Some(url)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn set(&self, key: &str, url: String) -> BoxFuture<'_, Result<(), StoreError>> {
        let path = self.path_for(key);
        Box::pin(async move {
            fs::write(&path, url).await?;
            Ok(())
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let mut entries = fs::read_dir(&self.root).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_type().await?.is_file() {
                    fs::remove_file(entry.path()).await?;
                }
            }
            Ok(())
        })
    }
}
