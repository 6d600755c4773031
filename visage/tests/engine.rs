//! End-to-end engine tests: coordinator → gateway → model, with the
//! gateway mounted in-process behind the coordinator's transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use visage::cache::{BoxFuture, MemoryStore, StoreError, TieredCache, UrlStore};
use visage::coordinator::{RenderTransport, RequestCoordinator, ResolveOptions, TransportError};
use visage::face::{face_controls, Axis, ControlKey, FaceValues};
use visage::invoker::{InvokerError, ModelRunner};
use visage::prefetch::{PrefetchBatchGenerator, PrefetchConfig};
use visage::request::{EditRequest, RenderPayload};
use visage::server::{AssetFetcher, CacheGateway, CacheNamespace, FsDurableStore};
use visage::DiskStore;

/// Model runner that counts invocations and mints a URL per payload.
struct CountingModel {
    calls: AtomicUsize,
}

impl ModelRunner for CountingModel {
    fn run(&self, payload: &RenderPayload) -> BoxFuture<'_, Result<String, InvokerError>> {
        let serial = self.calls.fetch_add(1, Ordering::SeqCst);
        let url = format!(
            "https://model.example.com/{serial}-{:?}.webp",
            payload.rotate_pitch
        );
        Box::pin(async move { Ok(url) })
    }
}

/// Asset fetcher returning canned bytes (no network in tests).
struct StaticAssets;

impl AssetFetcher for StaticAssets {
    fn fetch(&self, _url: &str) -> BoxFuture<'_, Result<Vec<u8>, StoreError>> {
        Box::pin(async { Ok(vec![0xEE; 32]) })
    }
}

/// Transport that calls the gateway in-process, counting round-trips.
struct GatewayTransport {
    gateway: Arc<CacheGateway>,
    calls: AtomicUsize,
}

impl RenderTransport for GatewayTransport {
    fn render(&self, payload: &RenderPayload) -> BoxFuture<'_, Result<String, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let payload = payload.clone();
        Box::pin(async move {
            self.gateway
                .resolve(&payload)
                .await
                .map(|resolution| resolution.url)
                .map_err(|e| TransportError::Status {
                    status: 500,
                    message: e.to_string(),
                })
        })
    }
}

struct Harness {
    _blob_dir: TempDir,
    _disk_dir: TempDir,
    model: Arc<CountingModel>,
    fast: Arc<MemoryStore>,
    transport: Arc<GatewayTransport>,
    coordinator: Arc<RequestCoordinator>,
}

impl Harness {
    fn new() -> Self {
        let blob_dir = TempDir::new().unwrap();
        let disk_dir = TempDir::new().unwrap();
        let model = Arc::new(CountingModel {
            calls: AtomicUsize::new(0),
        });
        let fast = Arc::new(MemoryStore::default());
        let gateway = Arc::new(CacheGateway::new(
            CacheNamespace::new("bogini/expression-editor"),
            fast.clone(),
            Arc::new(
                FsDurableStore::new(blob_dir.path(), "https://blobs.example.com").unwrap(),
            ),
            model.clone(),
            Arc::new(StaticAssets),
        ));
        let transport = Arc::new(GatewayTransport {
            gateway: gateway.clone(),
            calls: AtomicUsize::new(0),
        });
        let coordinator = Arc::new(RequestCoordinator::new(
            transport.clone(),
            TieredCache::new(
                Arc::new(MemoryStore::default()),
                Some(Arc::new(DiskStore::new(disk_dir.path()).unwrap())),
            ),
        ));
        Self {
            _blob_dir: blob_dir,
            _disk_dir: disk_dir,
            model,
            fast,
            transport,
            coordinator,
        }
    }

    /// Fresh client (empty client-side tiers) over the same gateway.
    fn fresh_client(&self) -> Arc<RequestCoordinator> {
        Arc::new(RequestCoordinator::new(
            self.transport.clone(),
            TieredCache::new(Arc::new(MemoryStore::default()), None),
        ))
    }
}

fn request(pitch: f64) -> EditRequest {
    EditRequest::new(
        "https://photos.example.com/face.jpg",
        FaceValues::neutral().with(Axis::RotatePitch, pitch),
    )
}

#[tokio::test]
async fn test_client_tiers_absorb_repeat_edits() {
    let harness = Harness::new();

    let first = harness
        .coordinator
        .resolve(&request(3.2), ResolveOptions::default())
        .await
        .unwrap();
    let second = harness
        .coordinator
        .resolve(&request(3.2), ResolveOptions::default())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(harness.transport.calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_server_cache_survives_client_restart() {
    let harness = Harness::new();

    // First client renders once; persistence runs behind the response.
    harness
        .coordinator
        .resolve(&request(3.2), ResolveOptions::default())
        .await
        .unwrap();

    // Wait for the write-behind persistence to land in the fast store.
    let payload = request(3.2).payload(harness.coordinator.quantizer());
    let path = CacheNamespace::new("bogini/expression-editor")
        .path_for(&visage::scoped_key("bogini/expression-editor", &payload));
    let mut persisted = false;
    for _ in 0..100 {
        if harness.fast.get(&path).await.unwrap().is_some() {
            persisted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(persisted, "write-behind persistence never landed");

    // A brand-new client with cold tiers resolves the identical payload
    // without the model running again.
    let calls_before = harness.model.calls.load(Ordering::SeqCst);
    let fresh = harness.fresh_client();
    let url = fresh
        .resolve(&request(3.2), ResolveOptions::default())
        .await
        .unwrap();
    assert!(url.is_some());
    assert_eq!(harness.model.calls.load(Ordering::SeqCst), calls_before);
}

#[tokio::test]
async fn test_persistent_tier_survives_memory_clear() {
    let harness = Harness::new();

    harness
        .coordinator
        .resolve(&request(6.67), ResolveOptions::default())
        .await
        .unwrap();
    harness.coordinator.clear_memory_tier().await;

    let transport_calls = harness.transport.calls.load(Ordering::SeqCst);
    let hit = harness
        .coordinator
        .resolve(&request(6.67), ResolveOptions::default())
        .await
        .unwrap();

    assert!(hit.is_some());
    assert_eq!(
        harness.transport.calls.load(Ordering::SeqCst),
        transport_calls,
        "disk tier must answer after the memory tier is cleared"
    );
}

#[tokio::test]
async fn test_control_prefetch_makes_live_edits_instant() {
    let harness = Harness::new();
    let generator = PrefetchBatchGenerator::with_config(
        harness.coordinator.clone(),
        PrefetchConfig { max_concurrent: 8 },
    );
    let controls = face_controls();
    let eyebrows = controls
        .iter()
        .find(|c| c.key == ControlKey::Eyebrows)
        .unwrap();

    let outcome = generator
        .prefetch_for_control(
            "https://photos.example.com/face.jpg",
            &FaceValues::neutral(),
            eyebrows,
            CancellationToken::new(),
        )
        .await;
    assert_eq!(outcome.completed, 7);
    assert_eq!(outcome.failed, 0);

    // Every eyebrow position the UI can produce is now a client cache hit.
    let transport_calls = harness.transport.calls.load(Ordering::SeqCst);
    for raw in [-10.0, -7.2, 0.0, 8.9, 15.0] {
        let edit = EditRequest::new(
            "https://photos.example.com/face.jpg",
            FaceValues::neutral().with(Axis::Eyebrow, raw),
        );
        let url = harness
            .coordinator
            .resolve(&edit, ResolveOptions::default())
            .await
            .unwrap();
        assert!(url.is_some());
    }
    assert_eq!(harness.transport.calls.load(Ordering::SeqCst), transport_calls);
}
