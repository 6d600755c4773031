//! Dual-tier cache gateway in front of the hosted model.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::durable::DurableStore;
use super::path::CacheNamespace;
use crate::cache::{BoxFuture, StoreError, UrlStore};
use crate::invoker::{InvokerError, ModelRunner};
use crate::request::{scoped_key, RenderPayload};

/// Errors surfaced by gateway resolution.
///
/// Store failures never appear here — they are logged and degrade to
/// cache misses (reads) or lost persistence (writes).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The model invocation failed or timed out.
    #[error(transparent)]
    Model(#[from] InvokerError),
}

/// Fetches rendered asset bytes for durable persistence.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, StoreError>>;
}

/// HTTP asset fetcher.
pub struct HttpAssetFetcher {
    client: reqwest::Client,
}

impl HttpAssetFetcher {
    pub fn new() -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| StoreError::Backend(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl AssetFetcher for HttpAssetFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, StoreError>> {
        let url = url.to_string();
        Box::pin(async move {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| StoreError::Backend(format!("asset fetch failed: {e}")))?;
            if !response.status().is_success() {
                return Err(StoreError::Backend(format!(
                    "asset fetch returned HTTP {}",
                    response.status()
                )));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| StoreError::Backend(format!("asset body read failed: {e}")))?;
            Ok(bytes.to_vec())
        })
    }
}

/// Outcome of one gateway resolution, for response building and logging.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Resolved asset URL.
    pub url: String,
    /// Whether a cache tier answered (false means the model ran).
    pub cache_hit: bool,
    /// The derived cache key.
    pub key: String,
}

/// Resolves quantized payloads from the fast store, the durable store or
/// the model, in that order of preference.
pub struct CacheGateway {
    namespace: CacheNamespace,
    fast: Arc<dyn UrlStore>,
    durable: Arc<dyn DurableStore>,
    model: Arc<dyn ModelRunner>,
    assets: Arc<dyn AssetFetcher>,
}

impl CacheGateway {
    pub fn new(
        namespace: CacheNamespace,
        fast: Arc<dyn UrlStore>,
        durable: Arc<dyn DurableStore>,
        model: Arc<dyn ModelRunner>,
        assets: Arc<dyn AssetFetcher>,
    ) -> Self {
        Self {
            namespace,
            fast,
            durable,
            model,
            assets,
        }
    }

    /// Resolve `payload` to an asset URL.
    ///
    /// Both cache tiers are queried concurrently; the fast tier wins
    /// ties. A durable-only hit backfills the fast tier behind the
    /// response. A full miss invokes the model and persists the result
    /// without blocking the caller.
    pub async fn resolve(&self, payload: &RenderPayload) -> Result<Resolution, GatewayError> {
        let key = scoped_key(self.namespace.model_identifier(), payload);
        let path = self.namespace.path_for(&key);

        let (fast_hit, durable_hit) =
            tokio::join!(self.lookup_fast(&path), self.lookup_durable(&path));

        if let Some(url) = fast_hit {
            debug!(%key, "fast store hit");
            return Ok(Resolution {
                url,
                cache_hit: true,
                key,
            });
        }

        if let Some(url) = durable_hit {
            debug!(%key, "durable store hit, backfilling fast store");
            self.spawn_fast_backfill(path, url.clone());
            return Ok(Resolution {
                url,
                cache_hit: true,
                key,
            });
        }

        let url = self.model.run(payload).await?;
        self.spawn_persist(path, url.clone(), payload.output_format.extension());
        Ok(Resolution {
            url,
            cache_hit: false,
            key,
        })
    }

    async fn lookup_fast(&self, path: &str) -> Option<String> {
        match self.fast.get(path).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, path, "fast store read failed");
                None
            }
        }
    }

    async fn lookup_durable(&self, path: &str) -> Option<String> {
        match self.durable.find(path).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, path, "durable store read failed");
                None
            }
        }
    }

    /// Self-heal the fast store from a durable hit, off the request path.
    fn spawn_fast_backfill(&self, path: String, url: String) {
        let fast = Arc::clone(&self.fast);
        tokio::spawn(async move {
            if let Err(e) = fast.set(&path, url).await {
                warn!(error = %e, path, "fast store backfill failed");
            }
        });
    }

    /// Persist a fresh render into both tiers, off the request path.
    ///
    /// Failures here only degrade future hit rate; the caller already
    /// has its URL.
    fn spawn_persist(&self, path: String, url: String, extension: &'static str) {
        let fast = Arc::clone(&self.fast);
        let durable = Arc::clone(&self.durable);
        let assets = Arc::clone(&self.assets);
        tokio::spawn(async move {
            let bytes = match assets.fetch(&url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, path, "asset fetch for persistence failed");
                    return;
                }
            };

            let object_key = format!("{path}.{extension}");
            let stored_url = match durable.put(&object_key, bytes).await {
                Ok(stored_url) => stored_url,
                Err(e) => {
                    warn!(error = %e, path, "durable store write failed");
                    return;
                }
            };

            if let Err(e) = fast.set(&path, stored_url).await {
                warn!(error = %e, path, "fast store write-through failed");
            }
        });
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::face::FaceValues;
    use crate::quantize::Quantizer;
    use crate::request::OutputSettings;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub fn payload() -> RenderPayload {
        RenderPayload::new(
            "img",
            &FaceValues::neutral(),
            &OutputSettings::default(),
            &Quantizer::default(),
        )
    }

    /// Model runner that counts invocations.
    pub struct CountingRunner {
        pub calls: AtomicUsize,
        pub response: Result<String, ()>,
    }

    impl CountingRunner {
        pub fn returning(url: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Ok(url.to_string()),
            }
        }

        pub fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Err(()),
            }
        }
    }

    impl ModelRunner for CountingRunner {
        fn run(&self, _payload: &RenderPayload) -> BoxFuture<'_, Result<String, InvokerError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self.response.clone();
            Box::pin(async move {
                response.map_err(|_| InvokerError::PredictionFailed("scripted failure".to_string()))
            })
        }
    }

    /// In-memory durable store for tests.
    #[derive(Default)]
    pub struct MemoryDurableStore {
        pub objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl DurableStore for MemoryDurableStore {
        fn find(&self, prefix: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
            let prefix = prefix.to_string();
            Box::pin(async move {
                let objects = self.objects.lock();
                Ok(objects
                    .keys()
                    .find(|key| key.starts_with(&prefix))
                    .map(|key| format!("https://blobs.example.com/{key}")))
            })
        }

        fn put(&self, key: &str, bytes: Vec<u8>) -> BoxFuture<'_, Result<String, StoreError>> {
            let key = key.to_string();
            Box::pin(async move {
                self.objects.lock().insert(key.clone(), bytes);
                Ok(format!("https://blobs.example.com/{key}"))
            })
        }
    }

    /// Asset fetcher returning canned bytes.
    pub struct StaticAssetFetcher;

    impl AssetFetcher for StaticAssetFetcher {
        fn fetch(&self, _url: &str) -> BoxFuture<'_, Result<Vec<u8>, StoreError>> {
            Box::pin(async { Ok(vec![0xAB; 16]) })
        }
    }

    fn gateway(
        fast: Arc<MemoryStore>,
        durable: Arc<MemoryDurableStore>,
        model: Arc<CountingRunner>,
    ) -> CacheGateway {
        CacheGateway::new(
            CacheNamespace::new("bogini/expression-editor"),
            fast,
            durable,
            model,
            Arc::new(StaticAssetFetcher),
        )
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached within 500ms");
    }

    #[tokio::test]
    async fn test_fast_hit_never_calls_model() {
        let fast = Arc::new(MemoryStore::default());
        let durable = Arc::new(MemoryDurableStore::default());
        let model = Arc::new(CountingRunner::returning("https://model.example.com/x"));
        let gw = gateway(fast.clone(), durable, model.clone());

        let payload = payload();
        let key = scoped_key("bogini/expression-editor", &payload);
        let path = CacheNamespace::new("bogini/expression-editor").path_for(&key);
        fast.set(&path, "https://blobs.example.com/cached".to_string())
            .await
            .unwrap();

        let resolution = gw.resolve(&payload).await.unwrap();
        assert!(resolution.cache_hit);
        assert_eq!(resolution.url, "https://blobs.example.com/cached");
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_durable_hit_backfills_fast_store() {
        let fast = Arc::new(MemoryStore::default());
        let durable = Arc::new(MemoryDurableStore::default());
        let model = Arc::new(CountingRunner::returning("https://model.example.com/x"));
        let gw = gateway(fast.clone(), durable.clone(), model.clone());

        let payload = payload();
        let key = scoped_key("bogini/expression-editor", &payload);
        let path = CacheNamespace::new("bogini/expression-editor").path_for(&key);
        durable
            .put(&format!("{path}.webp"), vec![1, 2, 3])
            .await
            .unwrap();

        let resolution = gw.resolve(&payload).await.unwrap();
        assert!(resolution.cache_hit);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);

        // Backfill is async; wait for the fast store to self-heal.
        let mut healed = false;
        for _ in 0..100 {
            if fast.get(&path).await.unwrap().is_some() {
                healed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(healed, "fast store backfill did not land");
    }

    #[tokio::test]
    async fn test_miss_invokes_model_and_persists() {
        let fast = Arc::new(MemoryStore::default());
        let durable = Arc::new(MemoryDurableStore::default());
        let model = Arc::new(CountingRunner::returning("https://model.example.com/out"));
        let gw = gateway(fast.clone(), durable.clone(), model.clone());

        let payload = payload();
        let resolution = gw.resolve(&payload).await.unwrap();
        assert!(!resolution.cache_hit);
        assert_eq!(resolution.url, "https://model.example.com/out");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);

        // Persistence runs behind the response: durable object written
        // as <path>.<extension>, fast store pointed at the stored URL.
        let durable_probe = durable.clone();
        wait_for(move || !durable_probe.objects.lock().is_empty()).await;
        let object_key = durable.objects.lock().keys().next().unwrap().clone();
        assert!(object_key.ends_with(".webp"));

        let resolution = gw.resolve(&payload).await.unwrap();
        assert!(resolution.cache_hit);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1, "second resolve is cached");
    }

    #[tokio::test]
    async fn test_model_failure_surfaces() {
        let fast = Arc::new(MemoryStore::default());
        let durable = Arc::new(MemoryDurableStore::default());
        let model = Arc::new(CountingRunner::failing());
        let gw = gateway(fast, durable, model);

        let result = gw.resolve(&payload()).await;
        assert!(matches!(result, Err(GatewayError::Model(_))));
    }
}
