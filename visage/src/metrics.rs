//! Engine metrics for observability.
//!
//! Lock-free atomic counters recorded by the coordinator, the cache tiers
//! and the prefetch batches, with a point-in-time snapshot type for
//! display and tests.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for the edit engine.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    requests: AtomicU64,
    memory_hits: AtomicU64,
    persistent_hits: AtomicU64,
    superseded: AtomicU64,
    upstream_failures: AtomicU64,
    prefetch_submitted: AtomicU64,
    prefetch_deduplicated: AtomicU64,
    prefetch_failed: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolve call started (cache hit or not).
    pub fn request_started(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// The memory tier answered a lookup.
    pub fn memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// The persistent tier answered a lookup.
    pub fn persistent_hit(&self) {
        self.persistent_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// An in-flight request was superseded and its result discarded.
    pub fn request_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::Relaxed);
    }

    /// The upstream render call failed.
    pub fn upstream_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A prefetch job entered the concurrency gate.
    pub fn prefetch_job_submitted(&self) {
        self.prefetch_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// A prefetch job was dropped because its key was already submitted.
    pub fn prefetch_job_deduplicated(&self) {
        self.prefetch_deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    /// A prefetch job failed (isolated; the batch continues).
    pub fn prefetch_job_failed(&self) {
        self.prefetch_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            persistent_hits: self.persistent_hits.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            prefetch_submitted: self.prefetch_submitted.load(Ordering::Relaxed),
            prefetch_deduplicated: self.prefetch_deduplicated.load(Ordering::Relaxed),
            prefetch_failed: self.prefetch_failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`EngineMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub memory_hits: u64,
    pub persistent_hits: u64,
    pub superseded: u64,
    pub upstream_failures: u64,
    pub prefetch_submitted: u64,
    pub prefetch_deduplicated: u64,
    pub prefetch_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_starts_at_zero() {
        let metrics = EngineMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = EngineMetrics::new();
        metrics.request_started();
        metrics.request_started();
        metrics.memory_hit();
        metrics.request_superseded();
        metrics.prefetch_job_deduplicated();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests, 2);
        assert_eq!(snapshot.memory_hits, 1);
        assert_eq!(snapshot.superseded, 1);
        assert_eq!(snapshot.prefetch_deduplicated, 1);
        assert_eq!(snapshot.upstream_failures, 0);
    }
}
