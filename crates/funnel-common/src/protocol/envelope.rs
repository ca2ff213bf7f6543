//! Invocation Envelope
//!
//! The [`Envelope`] is the canonical invocation input: an open context map
//! plus an opaque payload whose shape was decided by the caller's
//! content-type. It is produced by the request shaper, serialised as JSON
//! and POSTed to a worker child verbatim. Once built it is never mutated.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Context key holding the per-invocation timeout in milliseconds.
pub const TIMEOUT_KEY: &str = "timeout";

/// Context key holding the secret name → value map.
pub const SECRETS_KEY: &str = "secrets";

/// Context key holding the inbound request snapshot (method, uri, headers).
pub const REQUEST_KEY: &str = "request";

/// The payload of an invocation.
///
/// The variant is decided by the request's content-type: `application/base64`
/// decodes to `Bytes`, `text/plain` to `Text`, and the structured media
/// types (JSON, YAML, query parameters) to `Json`. On the wire all variants
/// become JSON — bytes are re-encoded as a standard-base64 string, matching
/// what language runtimes expect to receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Bytes(Vec<u8>),
    Text(String),
    Json(Value),
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::None => serializer.serialize_none(),
            Payload::Bytes(bytes) => serializer.serialize_str(&BASE64.encode(bytes)),
            Payload::Text(text) => serializer.serialize_str(text),
            Payload::Json(value) => value.serialize(serializer),
        }
    }
}

/// The canonical invocation input passed from the shaper to the pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub context: Map<String, Value>,
    pub payload: Payload,
}

impl Envelope {
    pub fn new(context: Map<String, Value>, payload: Payload) -> Self {
        Self { context, payload }
    }

    /// An envelope with an empty context and no payload.
    pub fn empty() -> Self {
        Self::new(Map::new(), Payload::None)
    }

    /// The per-invocation deadline in milliseconds taken from the context.
    ///
    /// A missing, zero or non-integer `timeout` entry means "no deadline".
    pub fn timeout_ms(&self) -> u64 {
        self.context
            .get(TIMEOUT_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_envelope_has_no_deadline() {
        assert_eq!(Envelope::empty().timeout_ms(), 0);
    }

    #[test]
    fn test_timeout_read_from_context() {
        let mut context = Map::new();
        context.insert(TIMEOUT_KEY.into(), json!(1500));
        let envelope = Envelope::new(context, Payload::None);
        assert_eq!(envelope.timeout_ms(), 1500);
    }

    #[test]
    fn test_negative_timeout_treated_as_none() {
        let mut context = Map::new();
        context.insert(TIMEOUT_KEY.into(), json!(-5));
        let envelope = Envelope::new(context, Payload::None);
        assert_eq!(envelope.timeout_ms(), 0);
    }

    #[test]
    fn test_json_payload_serialises_verbatim() {
        let envelope = Envelope::new(Map::new(), Payload::Json(json!({"n": 3})));
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire, json!({"context": {}, "payload": {"n": 3}}));
    }

    #[test]
    fn test_text_payload_serialises_as_string() {
        let envelope = Envelope::new(Map::new(), Payload::Text("hello".into()));
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire["payload"], json!("hello"));
    }

    #[test]
    fn test_bytes_payload_serialises_as_base64() {
        let envelope = Envelope::new(Map::new(), Payload::Bytes(b"funnel".to_vec()));
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire["payload"], json!("ZnVubmVs"));
    }

    #[test]
    fn test_absent_payload_serialises_as_null() {
        let wire = serde_json::to_value(Envelope::empty()).unwrap();
        assert_eq!(wire["payload"], Value::Null);
    }
}
