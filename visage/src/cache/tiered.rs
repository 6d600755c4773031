//! Client-side tiered cache chain.
//!
//! Tiers are consulted in latency order: memory first, then the
//! persistent store. A persistent hit is promoted into the memory tier
//! so the next lookup stays off the filesystem. All tier failures are
//! logged and treated as misses (reads) or no-ops (writes); the chain
//! never fails a request.

use std::sync::Arc;

use tracing::warn;

use super::traits::UrlStore;
use crate::metrics::EngineMetrics;

/// Memory tier plus optional persistent tier, in fixed lookup order.
pub struct TieredCache {
    memory: Arc<dyn UrlStore>,
    persistent: Option<Arc<dyn UrlStore>>,
    metrics: Option<Arc<EngineMetrics>>,
}

impl TieredCache {
    /// Chain a memory tier and a persistent tier.
    pub fn new(memory: Arc<dyn UrlStore>, persistent: Option<Arc<dyn UrlStore>>) -> Self {
        Self {
            memory,
            persistent,
            metrics: None,
        }
    }

    /// Attach metrics for hit reporting.
    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Look `key` up across the tiers.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.memory.get(key).await {
            Ok(Some(url)) => {
                if let Some(ref m) = self.metrics {
                    m.memory_hit();
                }
                return Some(url);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, key, "memory tier read failed"),
        }

        let persistent = self.persistent.as_ref()?;
        match persistent.get(key).await {
            Ok(Some(url)) => {
                if let Some(ref m) = self.metrics {
                    m.persistent_hit();
                }
                // Promote so the next lookup is answered from memory.
                if let Err(e) = self.memory.set(key, url.clone()).await {
                    warn!(error = %e, key, "memory tier promotion failed");
                }
                Some(url)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, key, "persistent tier read failed");
                None
            }
        }
    }

    /// Write `url` into every tier.
    pub async fn set(&self, key: &str, url: &str) {
        if let Err(e) = self.memory.set(key, url.to_string()).await {
            warn!(error = %e, key, "memory tier write failed");
        }
        if let Some(ref persistent) = self.persistent {
            if let Err(e) = persistent.set(key, url.to_string()).await {
                warn!(error = %e, key, "persistent tier write failed");
            }
        }
    }

    /// Drop every memory-tier entry. The persistent tier is untouched.
    pub async fn clear_memory(&self) {
        if let Err(e) = self.memory.clear().await {
            warn!(error = %e, "memory tier clear failed");
        }
    }
}
