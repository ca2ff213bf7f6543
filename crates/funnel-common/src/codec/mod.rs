//! Content-Type Codecs
//!
//! This module provides the codecs that read typed payloads out of HTTP
//! request bodies and write [`Message`]s into HTTP response bodies, keyed
//! on media type.
//!
//! # Components
//!
//! - **[`BodyCodec`]**: the per-media-type read/write contract
//! - **[`CodecRegistry`]**: an ordered codec sequence; the first codec that
//!   advertises support for a media type wins
//!
//! # Media Types
//!
//! | Media type | Payload shape |
//! |------------|---------------|
//! | `application/json`, bare `json` suffix | structured value |
//! | `application/yaml`, bare `yaml` suffix | structured value |
//! | `application/base64` | byte sequence |
//! | `text/plain` | string |
//!
//! A `…+suffix` fragment (e.g. `application/vnd.acme+json`) is keyed on its
//! suffix. On write, a missing, wildcard or JSON-compatible Accept header
//! resolves to `application/json`.

mod base64;
mod json;
mod text;
mod yaml;

pub use self::base64::Base64Codec;
pub use self::json::JsonCodec;
pub use self::text::PlainTextCodec;
pub use self::yaml::YamlCodec;

use crate::protocol::{FunnelError, Message, Payload, Result};

/// Media type used when none is supplied.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// A converter between one family of media types and payloads/messages.
///
/// `read` produces the payload shape natural to the codec; `write` renders
/// a full `Message`. Codecs whose representation cannot carry a structured
/// `Message` (base64, plain text) report `can_write` as false and are
/// skipped on the write path.
pub trait BodyCodec: Send + Sync {
    /// The canonical content-type emitted with this codec's output.
    fn content_type(&self) -> &'static str;

    fn can_read(&self, media_type: &str) -> bool;

    fn can_write(&self, media_type: &str) -> bool;

    fn read(&self, body: &[u8]) -> Result<Payload>;

    fn write(&self, message: &Message) -> Result<Vec<u8>>;
}

/// Reduces a media type to its `+suffix` fragment when one is present.
///
/// `application/vnd.acme+json` → `json`; anything without exactly one `+`
/// is returned unchanged.
pub fn media_type_suffix(media_type: &str) -> &str {
    let mut fragments = media_type.splitn(2, '+');
    match (fragments.next(), fragments.next()) {
        (Some(_), Some(suffix)) => suffix,
        _ => media_type,
    }
}

const JSON_COMPATIBLE_RANGES: [&str; 4] =
    ["application/json", "application/*", "*/json", "*/*"];

/// Resolves an Accept header value for the write path.
///
/// An empty header, or one containing a JSON-compatible media range
/// (`application/json`, `application/*`, `*/json`, `*/*`) anywhere in its
/// value — q-parameters and surrounding ranges included — resolves to
/// `application/json`; everything else is kept as given. The match is
/// deliberately a substring scan so compound headers like a browser's
/// `text/html,application/xml;q=0.9,*/*;q=0.8` land on JSON.
pub fn resolve_accept(accept: &str) -> &str {
    let accept = accept.trim();
    if accept.is_empty()
        || JSON_COMPATIBLE_RANGES
            .iter()
            .any(|range| accept.contains(range))
    {
        DEFAULT_MEDIA_TYPE
    } else {
        accept
    }
}

/// An ordered sequence of codecs consulted first-match-first.
pub struct CodecRegistry {
    codecs: Vec<Box<dyn BodyCodec>>,
}

impl CodecRegistry {
    pub fn new(codecs: Vec<Box<dyn BodyCodec>>) -> Self {
        Self { codecs }
    }

    /// The standard registry: JSON, YAML, base64, plain text.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Box::new(JsonCodec),
            Box::new(YamlCodec),
            Box::new(Base64Codec),
            Box::new(PlainTextCodec),
        ])
    }

    /// Reads a payload from `body` using the first codec that supports
    /// `media_type`.
    ///
    /// # Errors
    ///
    /// `UnsupportedMediaType` when no codec matches; `BadRequest` when the
    /// matching codec cannot decode the body.
    pub fn read(&self, media_type: &str, body: &[u8]) -> Result<Payload> {
        for codec in &self.codecs {
            if codec.can_read(media_type) {
                return codec.read(body);
            }
        }
        Err(FunnelError::UnsupportedMediaType(media_type.to_string()))
    }

    /// Writes `message` for the given Accept header value.
    ///
    /// Returns the response content-type together with the encoded bytes.
    ///
    /// # Errors
    ///
    /// `UnsupportedMediaType` when no codec can render a `Message` as the
    /// requested media type.
    pub fn write(&self, accept: &str, message: &Message) -> Result<(&'static str, Vec<u8>)> {
        let media_type = resolve_accept(accept);
        for codec in &self.codecs {
            if codec.can_write(media_type) {
                return Ok((codec.content_type(), codec.write(message)?));
            }
        }
        Err(FunnelError::UnsupportedMediaType(accept.to_string()))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Logs, Message};
    use serde_json::json;

    #[test]
    fn test_media_type_suffix() {
        assert_eq!(media_type_suffix("application/vnd.acme+json"), "json");
        assert_eq!(media_type_suffix("application/json"), "application/json");
        assert_eq!(media_type_suffix("text/plain"), "text/plain");
    }

    #[test]
    fn test_resolve_accept_json_compatible() {
        for accept in ["", "*/*", "application/*", "*/json", "application/json"] {
            assert_eq!(resolve_accept(accept), "application/json");
        }
    }

    #[test]
    fn test_resolve_accept_compound_header_with_q_values() {
        assert_eq!(resolve_accept("application/json;q=0.9"), "application/json");
        assert_eq!(
            resolve_accept("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
            "application/json"
        );
        assert_eq!(
            resolve_accept("text/plain, */json"),
            "application/json"
        );
    }

    #[test]
    fn test_resolve_accept_keeps_concrete_types() {
        assert_eq!(resolve_accept("application/yaml"), "application/yaml");
        assert_eq!(resolve_accept("text/plain"), "text/plain");
    }

    #[test]
    fn test_read_unsupported_media_type() {
        let registry = CodecRegistry::with_defaults();
        let err = registry.read("application/xml", b"<x/>").unwrap_err();
        assert!(matches!(err, FunnelError::UnsupportedMediaType(_)));
    }

    #[test]
    fn test_read_dispatches_on_media_type() {
        let registry = CodecRegistry::with_defaults();
        assert_eq!(
            registry.read("application/json", br#"{"a":1}"#).unwrap(),
            Payload::Json(json!({"a": 1}))
        );
        assert_eq!(
            registry.read("text/plain", b"hello").unwrap(),
            Payload::Text("hello".into())
        );
        assert_eq!(
            registry.read("application/base64", b"ZnVubmVs").unwrap(),
            Payload::Bytes(b"funnel".to_vec())
        );
    }

    #[test]
    fn test_write_defaults_to_json() {
        let registry = CodecRegistry::with_defaults();
        let message = Message::success(json!({"ok": true}), Logs::default());
        let (content_type, body) = registry.write("*/*", &message).unwrap();
        assert_eq!(content_type, "application/json");
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["payload"], json!({"ok": true}));
    }

    #[test]
    fn test_write_yaml() {
        let registry = CodecRegistry::with_defaults();
        let message = Message::success(json!(1), Logs::default());
        let (content_type, body) = registry.write("application/yaml", &message).unwrap();
        assert_eq!(content_type, "application/yaml");
        assert!(String::from_utf8(body).unwrap().contains("payload: 1"));
    }

    #[test]
    fn test_write_unrepresentable_accept() {
        let registry = CodecRegistry::with_defaults();
        let message = Message::success(json!(1), Logs::default());
        let err = registry.write("text/plain", &message).unwrap_err();
        assert!(matches!(err, FunnelError::UnsupportedMediaType(_)));
    }

    #[test]
    fn test_round_trip_per_content_type() {
        let registry = CodecRegistry::with_defaults();
        let cases: Vec<(&str, &[u8], Payload)> = vec![
            (
                "application/json",
                br#"{"x":[1,2]}"#,
                Payload::Json(json!({"x": [1, 2]})),
            ),
            ("application/yaml", b"x: 1\n", Payload::Json(json!({"x": 1}))),
            ("text/plain", b"plain text", Payload::Text("plain text".into())),
            (
                "application/base64",
                b"AAEC",
                Payload::Bytes(vec![0, 1, 2]),
            ),
        ];
        for (media_type, body, expected) in cases {
            assert_eq!(registry.read(media_type, body).unwrap(), expected);
        }
    }
}
