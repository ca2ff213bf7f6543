//! Funnel Worker Pool
//!
//! The core of the sidecar: a bounded pool of language-runtime worker child
//! processes and the dispatch engine that routes each invocation to exactly
//! one idle worker.
//!
//! # Architecture
//!
//! - **[`Worker`]**: one child process bound to a reserved local port, with
//!   a dedicated HTTP client and per-invocation stdout/stderr capture
//! - **[`WorkerFactory`]** / **[`CommandFactory`]**: produces not-yet-started
//!   workers from a parsed command template
//! - **[`Dispatcher`]**: owns N workers; bounds concurrency with a counting
//!   semaphore, reuses workers LIFO, recycles workers that exceed their
//!   deadline and reports an unrepairable pool through [`HealthSignal`]
//!
//! # Concurrency Model
//!
//! Up to N invocations run in parallel, one per worker. `delegate` is the
//! single entry point and may be called from any number of request handlers
//! concurrently; callers beyond capacity block on the semaphore in FIFO
//! order.

pub mod dispatcher;
pub mod factory;
pub mod health;
pub mod worker;

pub use dispatcher::{Dispatcher, FIRST_PORT};
pub use factory::{CommandFactory, WorkerFactory};
pub use health::HealthSignal;
pub use worker::Worker;
