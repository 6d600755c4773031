//! Asset prefetch hook.
//!
//! After a render resolves, the engine warms whatever image cache the UI
//! layer uses so the asset is on screen the moment the URL is applied.
//! Decoding and display caching live outside this crate; the hook only
//! triggers the fetch.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::cache::BoxFuture;

/// Warms an image cache with a resolved asset URL.
pub trait AssetPrefetcher: Send + Sync {
    /// Fetch `url` into the UI layer's image cache. Failures are the
    /// implementation's to log; prefetching is an optimization.
    fn prefetch(&self, url: &str) -> BoxFuture<'_, ()>;
}

/// Prefetcher that does nothing. Default for headless use and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAssetPrefetcher;

impl AssetPrefetcher for NoopAssetPrefetcher {
    fn prefetch(&self, _url: &str) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// Prefetcher that issues a plain HTTP GET to warm CDN and OS caches.
pub struct HttpAssetPrefetcher {
    client: reqwest::Client,
}

impl HttpAssetPrefetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpAssetPrefetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetPrefetcher for HttpAssetPrefetcher {
    fn prefetch(&self, url: &str) -> BoxFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            match self.client.get(&url).send().await {
                Ok(response) => {
                    // Drain the body so the bytes actually travel.
                    let _ = response.bytes().await;
                }
                Err(e) => warn!(error = %e, url, "asset prefetch failed"),
            }
        })
    }
}

/// Wraps another prefetcher and drops URLs that are already in flight.
pub struct DedupingPrefetcher {
    inner: Arc<dyn AssetPrefetcher>,
    in_flight: Mutex<HashSet<String>>,
}

impl DedupingPrefetcher {
    pub fn new(inner: Arc<dyn AssetPrefetcher>) -> Self {
        Self {
            inner,
            in_flight: Mutex::new(HashSet::new()),
        }
    }
}

impl AssetPrefetcher for DedupingPrefetcher {
    fn prefetch(&self, url: &str) -> BoxFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            if !self.in_flight.lock().insert(url.clone()) {
                return;
            }
            self.inner.prefetch(&url).await;
            self.in_flight.lock().remove(&url);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPrefetcher {
        calls: AtomicUsize,
    }

    impl AssetPrefetcher for CountingPrefetcher {
        fn prefetch(&self, _url: &str) -> BoxFuture<'_, ()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {})
        }
    }

    #[tokio::test]
    async fn test_noop_prefetcher() {
        NoopAssetPrefetcher.prefetch("https://example.com/a.webp").await;
    }

    #[tokio::test]
    async fn test_dedupe_allows_sequential_repeats() {
        // In-flight dedupe only: once a fetch finishes, the same URL may
        // be fetched again.
        let inner = Arc::new(CountingPrefetcher {
            calls: AtomicUsize::new(0),
        });
        let deduping = DedupingPrefetcher::new(inner.clone());

        deduping.prefetch("u").await;
        deduping.prefetch("u").await;

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
