//! Dispatch Engine
//!
//! The [`Dispatcher`] owns the worker pool and serves
//! [`delegate`](Dispatcher::delegate): check out one idle worker under a
//! counting semaphore, invoke it, classify the outcome, recycle the worker
//! if it blew its deadline, and check the worker (or its successor) back
//! in.
//!
//! # Pool Shape
//!
//! The semaphore and the idle stack are deliberately separate primitives:
//! the semaphore is the capacity invariant and the blocking point, the
//! mutex-guarded stack is the identity of which worker to reuse. Workers
//! are checked out last-in-first-out, which keeps fewer workers hot.
//!
//! # Degradation
//!
//! A worker that times out may still be mid-response, so it is never
//! reused: it is terminated and a fresh worker is spawned on the same
//! port. If any step of that recycle fails, the pool has permanently lost
//! capacity and the [`HealthSignal`] flips to unhealthy.

use std::sync::{Arc, Mutex};

use funnel_common::protocol::{
    Envelope, Fault, FaultKind, FunnelError, Logs, Message, MessageContext, Result,
};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::factory::WorkerFactory;
use crate::health::HealthSignal;
use crate::worker::Worker;

/// Lowest port reserved for workers; a pool of capacity N occupies
/// `FIRST_PORT .. FIRST_PORT + N`.
pub const FIRST_PORT: u16 = 9000;

/// The worker pool and dispatch engine.
pub struct Dispatcher {
    idle: Mutex<Vec<Worker>>,
    semaphore: Semaphore,
    factory: Arc<dyn WorkerFactory>,
    health: Arc<HealthSignal>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("idle", &self.idle)
            .field("semaphore", &self.semaphore)
            .field("health", &self.health)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Builds a pool of `capacity` workers on consecutive ports starting at
    /// [`FIRST_PORT`], starting each in turn.
    ///
    /// # Errors
    ///
    /// `IllegalArgument` when `capacity` is zero; otherwise the first
    /// construction or start failure. Workers already started are dropped
    /// (their children die with the drop) — a failed construction never
    /// yields a usable dispatcher.
    pub fn new(capacity: usize, factory: Arc<dyn WorkerFactory>) -> Result<Self> {
        if capacity < 1 {
            return Err(FunnelError::IllegalArgument(format!(
                "pool capacity must be at least 1, got {capacity}"
            )));
        }

        let mut idle = Vec::with_capacity(capacity);
        for offset in 0..capacity {
            let port = FIRST_PORT + offset as u16;
            let mut worker = factory.create(port)?;
            worker.start()?;
            idle.push(worker);
        }
        info!(capacity, first_port = FIRST_PORT, "worker pool initialised");

        Ok(Self {
            idle: Mutex::new(idle),
            semaphore: Semaphore::new(capacity),
            factory,
            health: Arc::new(HealthSignal::new()),
        })
    }

    /// The pool's health signal, for the `/healthz` endpoint.
    pub fn health(&self) -> Arc<HealthSignal> {
        Arc::clone(&self.health)
    }

    /// Routes one invocation to an idle worker and folds the outcome into a
    /// [`Message`]. Never returns a naked failure: every fault is
    /// classified into the message's context.
    ///
    /// Callers beyond the pool capacity block here, FIFO, until a worker
    /// frees up. After [`shutdown`](Dispatcher::shutdown) the semaphore is
    /// closed and callers receive a `SystemError` message instead of
    /// blocking.
    pub async fn delegate(&self, envelope: &Envelope) -> Message {
        let permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return Message::failure(
                    Fault::new(FaultKind::SystemError, "dispatcher is shut down"),
                    None,
                )
            }
        };

        let checked_out = self
            .idle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop();
        let Some(worker) = checked_out else {
            // a previous recycle failed and left the pool short
            drop(permit);
            return Message::failure(
                Fault::new(FaultKind::SystemError, "no idle worker; pool is degraded"),
                None,
            );
        };

        let outcome = worker.invoke(envelope).await;
        // capture continues asynchronously; take whatever is committed now
        let logs = Logs {
            stdout: worker.stdout(),
            stderr: worker.stderr(),
        };

        let (fault, payload, returned) = match outcome {
            Ok(value) => (None, Some(value), Some(worker)),
            Err(err @ FunnelError::Timeout(_)) => {
                warn!(port = worker.port(), "invocation timed out, recycling worker");
                let fault = Fault::new(FaultKind::FunctionError, err.to_string());
                (Some(fault), None, self.recycle(worker).await)
            }
            Err(FunnelError::FunctionServer(fault)) => (Some(fault), None, Some(worker)),
            Err(err) => (
                Some(Fault::new(FaultKind::SystemError, err.to_string())),
                None,
                Some(worker),
            ),
        };

        // check-in must be visible before the permit frees a waiter
        {
            let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(worker) = returned {
                idle.push(worker);
            }
        }
        drop(permit);

        Message {
            context: MessageContext {
                error: fault,
                logs: Some(logs),
            },
            payload,
        }
    }

    /// Terminates the timed-out worker and spawns a successor on the same
    /// port. Runs on its own task so a panic anywhere in the path surfaces
    /// as a `JoinError` instead of propagating; any failure flips the
    /// health signal and leaves the slot empty.
    async fn recycle(&self, worker: Worker) -> Option<Worker> {
        let port = worker.port();
        let factory = Arc::clone(&self.factory);
        let attempt = tokio::spawn(async move {
            let mut worker = worker;
            worker.terminate()?;
            let mut successor = factory.create(port)?;
            successor.start()?;
            Ok::<Worker, FunnelError>(successor)
        })
        .await;

        match attempt {
            Ok(Ok(successor)) => {
                info!(port, "worker recycled");
                Some(successor)
            }
            Ok(Err(err)) => {
                error!(port, %err, "failed to recycle worker");
                self.health.report_unhealthy();
                None
            }
            Err(join_err) => {
                error!(port, %join_err, "recycle task panicked");
                self.health.report_unhealthy();
                None
            }
        }
    }

    /// Shuts down every idle worker, closing the pool to new delegates
    /// first. Failures are aggregated; the first call is the meaningful
    /// one.
    pub async fn shutdown(&self) -> Result<()> {
        self.semaphore.close();
        let workers: Vec<Worker> = self
            .idle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();

        let mut failed = 0usize;
        for mut worker in workers {
            if let Err(err) = worker.shutdown().await {
                warn!(port = worker.port(), %err, "worker failed to shut down");
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(FunnelError::UnknownSystem(format!(
                "failed to shut down {failed} worker(s)"
            )));
        }
        Ok(())
    }
}
