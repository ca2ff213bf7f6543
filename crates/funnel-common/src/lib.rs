//! Funnel Common
//!
//! Shared types for the funnel sidecar: the invocation protocol spoken
//! between the HTTP front-end, the worker pool and the worker child
//! processes, and the content-type codecs used to read request bodies and
//! write response messages.
//!
//! # Components
//!
//! - **[`protocol`]**: [`Envelope`](protocol::Envelope) (inbound invocation),
//!   [`Message`](protocol::Message) (outbound result), the
//!   [`Fault`](protocol::Fault) taxonomy and the shared
//!   [`FunnelError`](protocol::FunnelError) type
//! - **[`codec`]**: [`BodyCodec`](codec::BodyCodec) implementations keyed on
//!   media type, collected in a [`CodecRegistry`](codec::CodecRegistry)

pub mod codec;
pub mod protocol;

pub use codec::{BodyCodec, CodecRegistry};
pub use protocol::{Envelope, Fault, FaultKind, FunnelError, Logs, Message, Payload, Result};
