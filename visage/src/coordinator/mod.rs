//! Live-edit request coordination.
//!
//! [`RequestCoordinator`] owns one logical "live edit" channel: it
//! quantizes the request, derives its cache key, consults the client
//! tiers and only then crosses the network. Issuing a request with
//! `cancel_previous` bumps a generation counter; any older in-flight
//! request whose captured token no longer matches is discarded on
//! completion, so only the most recent gesture state ever reaches the
//! UI. Cancellation is cooperative: the transport call itself is not
//! aborted, only its effect is suppressed.
//!
//! [`DebouncedResolver`] layers a leading/trailing debounce window on
//! top for low-urgency callers.

mod assets;
mod debounce;
mod transport;

pub use assets::{AssetPrefetcher, DedupingPrefetcher, HttpAssetPrefetcher, NoopAssetPrefetcher};
pub use debounce::{DebouncePhase, DebouncedResolver, DEFAULT_DEBOUNCE_WINDOW};
pub use transport::{HttpRenderTransport, RenderTransport, TransportError};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::cache::TieredCache;
use crate::metrics::EngineMetrics;
use crate::quantize::Quantizer;
use crate::request::{payload_key, EditRequest};

/// Errors surfaced to the caller of [`RequestCoordinator::resolve`].
///
/// Cache-tier failures never appear here; they are contained inside the
/// tier chain. Supersession is not an error either — it resolves to
/// `Ok(None)`.
#[derive(Debug, Error)]
pub enum EditError {
    /// The upstream render call failed.
    #[error(transparent)]
    Upstream(#[from] TransportError),
}

/// Per-call options for [`RequestCoordinator::resolve`].
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Invalidate any in-flight request before issuing this one.
    /// Live gesture edits set this; prefetch jobs never do.
    pub cancel_previous: bool,
    /// Skip the client cache tiers and force a network round-trip.
    pub skip_cache: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            cancel_previous: true,
            skip_cache: false,
        }
    }
}

/// Coordinates one live-edit channel between gesture input and the
/// render gateway.
pub struct RequestCoordinator {
    quantizer: Quantizer,
    cache: TieredCache,
    transport: Arc<dyn RenderTransport>,
    assets: Arc<dyn AssetPrefetcher>,
    metrics: Arc<EngineMetrics>,
    /// Generation counter backing supersession. The token captured at
    /// request start must still equal this at completion for the result
    /// to be applied.
    generation: AtomicU64,
}

impl RequestCoordinator {
    /// Create a coordinator over `transport` and the client cache chain.
    pub fn new(transport: Arc<dyn RenderTransport>, cache: TieredCache) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        Self {
            quantizer: Quantizer::default(),
            cache: cache.with_metrics(metrics.clone()),
            transport,
            assets: Arc::new(NoopAssetPrefetcher),
            metrics,
            generation: AtomicU64::new(0),
        }
    }

    /// Use a non-default quantizer.
    pub fn with_quantizer(mut self, quantizer: Quantizer) -> Self {
        self.quantizer = quantizer;
        self
    }

    /// Attach an asset prefetch hook.
    pub fn with_assets(mut self, assets: Arc<dyn AssetPrefetcher>) -> Self {
        self.assets = assets;
        self
    }

    /// The quantizer used for every payload built by this coordinator.
    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }

    /// Metrics recorded by this coordinator and its cache chain.
    pub fn metrics(&self) -> Arc<EngineMetrics> {
        self.metrics.clone()
    }

    /// Resolve one edit request to an image URL.
    ///
    /// Returns `Ok(None)` when the request was superseded by a newer one
    /// while in flight; the stale result is discarded, never surfaced.
    pub async fn resolve(
        &self,
        request: &EditRequest,
        options: ResolveOptions,
    ) -> Result<Option<String>, EditError> {
        self.metrics.request_started();

        // Supersede before the cache lookup: a newer call must win even
        // if this one would have hit the cache while an older network
        // call was still in flight.
        let token = options
            .cancel_previous
            .then(|| self.generation.fetch_add(1, Ordering::SeqCst) + 1);

        let payload = request.payload(&self.quantizer);
        let key = payload_key(&payload);

        if !options.skip_cache {
            if let Some(url) = self.cache.get(&key).await {
                debug!(%key, "resolved from client cache");
                return Ok(Some(url));
            }
        }

        let url = match self.transport.render(&payload).await {
            Ok(url) => url,
            Err(e) => {
                self.metrics.upstream_failure();
                return Err(e.into());
            }
        };

        if let Some(token) = token {
            if token != self.generation.load(Ordering::SeqCst) {
                // A newer request took over while this one was in flight.
                self.metrics.request_superseded();
                debug!(%key, "discarding superseded result");
                return Ok(None);
            }
        }

        self.cache.set(&key, &url).await;
        self.assets.prefetch(&url).await;
        Ok(Some(url))
    }

    /// Drop every memory-tier cache entry.
    pub async fn clear_memory_tier(&self) {
        self.cache.clear_memory().await;
    }
}
