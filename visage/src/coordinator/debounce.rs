//! Debounced live-edit resolution.
//!
//! Gesture streams produce far more edit events than the model can
//! absorb. The debounced resolver coalesces bursts within a fixed window
//! into at most two invocations: a leading call for perceived
//! responsiveness and a trailing call carrying the final state.
//!
//! # State machine
//!
//! ```text
//! Idle            --submit--> PendingLeading   (fires immediately)
//! PendingLeading  --submit--> PendingTrailing  (stores latest, restarts window)
//! PendingTrailing --submit--> PendingTrailing  (replaces latest, restarts window)
//! PendingLeading  --window--> Idle
//! PendingTrailing --window--> Idle             (fires the stored request)
//! ```
//!
//! Every fired request goes through [`RequestCoordinator::resolve`] with
//! `cancel_previous = true`, so the coordinator's supersession logic
//! still guarantees that only the newest result is ever published.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::warn;

use super::{RequestCoordinator, ResolveOptions};
use crate::request::EditRequest;

/// Default coalescing window.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Debounce phase. See the module docs for the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
    /// No window open; the next submit fires immediately.
    Idle,
    /// The leading call fired; no further submits seen yet.
    PendingLeading,
    /// At least one submit arrived during the window; its latest request
    /// fires when the window elapses.
    PendingTrailing,
}

struct DebounceState {
    phase: DebouncePhase,
    latest: Option<EditRequest>,
    /// Bumped on every submit; an expiring timer whose epoch is stale
    /// was restarted by a newer submit and must not fire.
    epoch: u64,
}

/// Leading/trailing debounce wrapper around a [`RequestCoordinator`].
///
/// Resolved URLs are published on a `watch` channel; superseded and
/// failed requests publish nothing.
pub struct DebouncedResolver {
    coordinator: Arc<RequestCoordinator>,
    window: Duration,
    state: Arc<Mutex<DebounceState>>,
    results_tx: watch::Sender<Option<String>>,
}

impl DebouncedResolver {
    /// Wrap `coordinator` with the default 500 ms window.
    pub fn new(coordinator: Arc<RequestCoordinator>) -> Self {
        Self::with_window(coordinator, DEFAULT_DEBOUNCE_WINDOW)
    }

    /// Wrap `coordinator` with a custom window.
    pub fn with_window(coordinator: Arc<RequestCoordinator>, window: Duration) -> Self {
        let (results_tx, _) = watch::channel(None);
        Self {
            coordinator,
            window,
            state: Arc::new(Mutex::new(DebounceState {
                phase: DebouncePhase::Idle,
                latest: None,
                epoch: 0,
            })),
            results_tx,
        }
    }

    /// Channel carrying the most recently resolved URL.
    pub fn results(&self) -> watch::Receiver<Option<String>> {
        self.results_tx.subscribe()
    }

    /// Current debounce phase.
    pub fn phase(&self) -> DebouncePhase {
        self.state.lock().phase
    }

    /// Submit a live-edit request through the debounce window.
    pub fn submit(&self, request: EditRequest) {
        let (epoch, leading) = {
            let mut state = self.state.lock();
            state.epoch += 1;
            let leading = match state.phase {
                DebouncePhase::Idle => {
                    state.phase = DebouncePhase::PendingLeading;
                    Some(request)
                }
                DebouncePhase::PendingLeading | DebouncePhase::PendingTrailing => {
                    state.phase = DebouncePhase::PendingTrailing;
                    state.latest = Some(request);
                    None
                }
            };
            (state.epoch, leading)
        };
        if let Some(request) = leading {
            self.fire(request);
        }
        self.arm(epoch);
    }

    /// Spawn the window timer for `epoch`.
    fn arm(&self, epoch: u64) {
        let state = Arc::clone(&self.state);
        let coordinator = Arc::clone(&self.coordinator);
        let results_tx = self.results_tx.clone();
        let window = self.window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let trailing = {
                let mut state = state.lock();
                if state.epoch != epoch {
                    // A newer submit restarted the window.
                    return;
                }
                let trailing = match state.phase {
                    DebouncePhase::PendingTrailing => state.latest.take(),
                    _ => None,
                };
                state.phase = DebouncePhase::Idle;
                trailing
            };
            if let Some(request) = trailing {
                resolve_and_publish(coordinator, results_tx, request).await;
            }
        });
    }

    /// Fire a request immediately (leading edge).
    fn fire(&self, request: EditRequest) {
        let coordinator = Arc::clone(&self.coordinator);
        let results_tx = self.results_tx.clone();
        tokio::spawn(resolve_and_publish(coordinator, results_tx, request));
    }
}

async fn resolve_and_publish(
    coordinator: Arc<RequestCoordinator>,
    results_tx: watch::Sender<Option<String>>,
    request: EditRequest,
) {
    let options = ResolveOptions {
        cancel_previous: true,
        skip_cache: false,
    };
    match coordinator.resolve(&request, options).await {
        Ok(Some(url)) => {
            results_tx.send_replace(Some(url));
        }
        Ok(None) => {} // superseded by a newer edit
        Err(e) => warn!(error = %e, "debounced edit failed"),
    }
}
