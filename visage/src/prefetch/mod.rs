//! Batch prefetch: warm the caches for an entire parameter space.
//!
//! The generator enumerates parameter grids (see [`sweep`]) and pushes
//! each combination through the [`RequestCoordinator`] under a bounded
//! concurrency gate. The gate is a sliding window: submission order is
//! deterministic (enumeration order), completion order is not, and at no
//! instant are more than `max_concurrent` jobs dispatched-and-unresolved.
//!
//! Prefetch jobs never cancel the live edit channel nor each other; every
//! job resolves with `cancel_previous = false`. A job failure is logged
//! and isolated — the batch always runs to completion (or cancellation).

mod sweep;

pub use sweep::{control_sweep, rotation_sweep};

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::coordinator::{RequestCoordinator, ResolveOptions};
use crate::face::{face_controls, FaceControl, FaceValues};
use crate::request::{payload_key, EditRequest};

/// Default concurrency ceiling for prefetch batches.
const DEFAULT_MAX_CONCURRENT: usize = 250;

/// Configuration for prefetch batches.
#[derive(Debug, Clone)]
pub struct PrefetchConfig {
    /// Maximum jobs dispatched-and-unresolved at any instant.
    pub max_concurrent: usize,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

/// Result of a prefetch batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Jobs that entered the concurrency gate.
    pub submitted: usize,
    /// Jobs that resolved to a URL.
    pub completed: usize,
    /// Jobs dropped because their cache key was already submitted.
    pub deduplicated: usize,
    /// Jobs that failed (isolated; logged).
    pub failed: usize,
    /// Whether the batch was cancelled before draining.
    pub cancelled: bool,
    /// Distinct URLs produced by the batch.
    pub urls: Vec<String>,
}

/// Enumerates parameter grids and dispatches them through the bounded
/// concurrency gate.
pub struct PrefetchBatchGenerator {
    coordinator: Arc<RequestCoordinator>,
    config: PrefetchConfig,
}

impl PrefetchBatchGenerator {
    /// Create a generator with the default gate size.
    pub fn new(coordinator: Arc<RequestCoordinator>) -> Self {
        Self {
            coordinator,
            config: PrefetchConfig::default(),
        }
    }

    /// Create a generator with custom configuration.
    pub fn with_config(coordinator: Arc<RequestCoordinator>, config: PrefetchConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Warm the caches for every rotation combination of `image`.
    ///
    /// Returns the distinct URLs produced so the caller can hand them to
    /// its own image cache.
    pub async fn prefetch_all_combinations(
        &self,
        image: &str,
        cancel: CancellationToken,
    ) -> BatchOutcome {
        let quantizer = self.coordinator.quantizer();
        let grid = rotation_sweep(quantizer, &face_controls());
        let requests = grid
            .into_iter()
            .map(|values| EditRequest::new(image, values))
            .collect();
        self.run(requests, cancel).await
    }

    /// Warm the caches for every combination of `control`'s dimensions,
    /// holding the remaining axes at `current`.
    pub async fn prefetch_for_control(
        &self,
        image: &str,
        current: &FaceValues,
        control: &FaceControl,
        cancel: CancellationToken,
    ) -> BatchOutcome {
        let quantizer = self.coordinator.quantizer();
        let grid = control_sweep(quantizer, control, current);
        info!(
            control = control.label,
            combinations = grid.len(),
            "generating per-control prefetch batch"
        );
        let requests = grid
            .into_iter()
            .map(|values| EditRequest::new(image, values))
            .collect();
        self.run(requests, cancel).await
    }

    /// Run a batch of edit requests through the concurrency gate.
    ///
    /// Requests whose derived cache key duplicates an earlier request in
    /// the batch are dropped before submission.
    pub async fn run(
        &self,
        requests: Vec<EditRequest>,
        cancel: CancellationToken,
    ) -> BatchOutcome {
        let metrics = self.coordinator.metrics();
        let mut outcome = BatchOutcome::default();

        // Key-level dedup in enumeration order.
        let mut seen_keys = HashSet::new();
        let mut jobs = Vec::with_capacity(requests.len());
        for request in requests {
            let key = payload_key(&request.payload(self.coordinator.quantizer()));
            if seen_keys.insert(key) {
                jobs.push(request);
            } else {
                metrics.prefetch_job_deduplicated();
                outcome.deduplicated += 1;
            }
        }

        // Sliding window over the gate: submit up to `max_concurrent`,
        // then one new job per completion.
        let mut pending = FuturesUnordered::new();
        let mut jobs_iter = jobs.into_iter();
        for request in jobs_iter.by_ref().take(self.config.max_concurrent) {
            metrics.prefetch_job_submitted();
            outcome.submitted += 1;
            pending.push(self.resolve_job(request));
        }

        let mut urls_seen = HashSet::new();
        while let Some(result) = pending.next().await {
            match result {
                Some(url) => {
                    outcome.completed += 1;
                    if urls_seen.insert(url.clone()) {
                        outcome.urls.push(url);
                    }
                }
                None => outcome.failed += 1,
            }

            if cancel.is_cancelled() {
                outcome.cancelled = true;
                info!(
                    completed = outcome.completed,
                    remaining = pending.len() + jobs_iter.len(),
                    "prefetch batch cancelled"
                );
                break;
            }

            if let Some(request) = jobs_iter.next() {
                metrics.prefetch_job_submitted();
                outcome.submitted += 1;
                pending.push(self.resolve_job(request));
            }
        }

        info!(
            submitted = outcome.submitted,
            completed = outcome.completed,
            deduplicated = outcome.deduplicated,
            failed = outcome.failed,
            unique_urls = outcome.urls.len(),
            "prefetch batch finished"
        );
        outcome
    }

    /// Resolve one prefetch job, isolating its failure.
    async fn resolve_job(&self, request: EditRequest) -> Option<String> {
        let options = ResolveOptions {
            cancel_previous: false,
            skip_cache: false,
        };
        match self.coordinator.resolve(&request, options).await {
            Ok(url) => url,
            Err(e) => {
                self.coordinator.metrics().prefetch_job_failed();
                warn!(error = %e, "prefetch job failed");
                None
            }
        }
    }
}
