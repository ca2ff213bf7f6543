//! Funnel Gateway
//!
//! The HTTP front-end of the sidecar: it turns inbound HTTP requests into
//! canonical invocation envelopes, hands them to the worker pool, and
//! writes the resulting message back in the representation the caller asked
//! for.
//!
//! # Components
//!
//! - **[`config`]**: environment-driven process configuration
//! - **[`injector`]**: the ordered context-injector chain (timeout, secrets,
//!   request metadata)
//! - **[`shaper`]**: request → [`Envelope`](funnel_common::Envelope)
//!   transformation
//! - **[`http_server`]**: the axum router (`/` for invocations, `/healthz`
//!   for the pool health signal)

pub mod config;
pub mod http_server;
pub mod injector;
pub mod shaper;
