//! Stand-ins for work the pages will eventually hand to a real backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::monitoring;

/// `idle -> busy -> idle` with a fixed delay and no failure branch.
///
/// Every `start` spawns its own timer. Nothing is deduplicated or cancelled:
/// the busy flag reflects whichever completion lands last.
#[derive(Debug, Clone)]
pub struct SimulatedOperation {
    kind: &'static str,
    busy: Arc<AtomicBool>,
}

impl SimulatedOperation {
    pub fn new(kind: &'static str) -> Self {
        SimulatedOperation {
            kind,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Go busy now; after `delay`, go idle and run `on_complete`.
    pub fn start<F>(&self, delay: Duration, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.busy.store(true, Ordering::SeqCst);
        monitoring::SIMULATED_OPERATIONS
            .with_label_values(&[self.kind])
            .inc();
        tracing::debug!(kind = self.kind, ?delay, "Simulated operation started");

        let busy = self.busy.clone();
        let kind = self.kind;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            busy.store(false, Ordering::SeqCst);
            tracing::debug!(kind, "Simulated operation finished");
            on_complete();
        })
    }
}
