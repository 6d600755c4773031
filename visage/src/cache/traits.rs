//! Core trait for URL cache tiers.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from a filesystem-backed tier.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Key-value interface shared by every cache tier.
///
/// Keys are cache-key digests (or digest-derived paths) and values are
/// resolved asset URLs. The interface is deliberately minimal; tier
/// ordering, promotion and error containment live in decorator layers.
///
/// Uses `Pin<Box<dyn Future>>` so tiers can be held as `Arc<dyn UrlStore>`
/// trait objects.
pub trait UrlStore: Send + Sync {
    /// Retrieve the URL stored under `key`, if any.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>>;

    /// Store `url` under `key`. Existing entries are replaced; entries are
    /// immutable in practice because a key is a digest of its request.
    fn set(&self, key: &str, url: String) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Remove every entry.
    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Backend("redis unreachable".to_string());
        assert!(err.to_string().contains("redis unreachable"));
    }

    #[test]
    fn test_store_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
