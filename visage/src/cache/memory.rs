//! In-memory URL store using moka.
//!
//! Wraps `moka::future::Cache` for an async-safe, lock-free memory tier
//! with automatic LRU eviction. Entries are small (a digest key and a
//! URL), so capacity is bounded by entry count rather than bytes.

use moka::future::Cache as MokaCache;

use super::traits::{BoxFuture, StoreError, UrlStore};

/// Default maximum number of cached URLs.
const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// In-memory URL store with LRU eviction.
pub struct MemoryStore {
    cache: MokaCache<String, String>,
}

impl MemoryStore {
    /// Create a store bounded to `max_entries` URLs.
    pub fn new(max_entries: u64) -> Self {
        Self {
            cache: MokaCache::builder().max_capacity(max_entries).build(),
        }
    }

    /// Current number of cached entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl UrlStore for MemoryStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.get(&key).await) })
    }

    fn set(&self, key: &str, url: String) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            self.cache.insert(key, url).await;
            Ok(())
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.cache.invalidate_all();
            self.cache.run_pending_tasks().await;
            Ok(())
        })
    }
}
