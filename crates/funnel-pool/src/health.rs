use std::sync::atomic::{AtomicBool, Ordering};

use tracing::error;

/// One-way health flag for the pool.
///
/// Starts healthy and transitions to unhealthy exactly once, when the
/// dispatcher fails to repair itself (a recycle that could not terminate,
/// rebuild or restart a worker). There is deliberately no way back: an
/// unrepairable pool means the host's port allocation or spawn path is
/// broken, and recovery is an operator concern — the process gets
/// restarted, the signal does not get re-armed.
///
/// Consumers poll with [`is_healthy`](HealthSignal::is_healthy); the
/// `/healthz` endpoint turns the answer into a status code.
#[derive(Debug, Default)]
pub struct HealthSignal {
    unhealthy: AtomicBool,
}

impl HealthSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking poll.
    pub fn is_healthy(&self) -> bool {
        !self.unhealthy.load(Ordering::Relaxed)
    }

    /// Transitions to unhealthy. Called by the dispatcher's recycle path.
    pub fn report_unhealthy(&self) {
        if !self.unhealthy.swap(true, Ordering::Relaxed) {
            error!("worker pool can no longer be repaired; now reporting unhealthy");
        }
    }
}
