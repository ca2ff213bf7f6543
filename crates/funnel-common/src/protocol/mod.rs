//! Funnel Protocol Definitions
//!
//! This module defines the invocation protocol carried through the sidecar:
//! the [`Envelope`] handed to a worker, the [`Message`] returned to the
//! caller, and the error types used throughout the workspace.
//!
//! # Wire Format
//!
//! Both sides of the worker protocol speak JSON:
//!
//! - An `Envelope` is POSTed to the worker child as
//!   `{"context": {...}, "payload": ...}`
//! - A `Message` is returned to the external caller as
//!   `{"context": {"error": ..., "logs": ...}, "payload": ...}`
//!
//! # Error Handling
//!
//! [`FunnelError`] is the single error enum for the workspace. Errors that
//! reach a caller are folded into a `Message` whose context carries a
//! [`Fault`] with one of three kinds: `InputError`, `FunctionError` or
//! `SystemError`.

pub mod envelope;
pub mod error;
pub mod message;

pub use envelope::{Envelope, Payload, REQUEST_KEY, SECRETS_KEY, TIMEOUT_KEY};
pub use error::{FunnelError, Result};
pub use message::{Fault, FaultKind, Logs, Message, MessageContext};
