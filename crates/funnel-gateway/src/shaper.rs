//! Request Shaping
//!
//! The [`RequestShaper`] transforms an inbound HTTP request into the
//! canonical [`Envelope`]: the injector chain populates the context, then
//! the payload is decoded from the body per content-type — or, for methods
//! that carry no body, composed from query parameters.

use std::sync::Arc;

use funnel_common::codec::{CodecRegistry, DEFAULT_MEDIA_TYPE};
use funnel_common::protocol::{Envelope, Payload, Result};
use serde_json::{Map, Value};

use crate::injector::{
    ContextInjector, EnvSecretInjector, RequestMeta, RequestMetadataInjector, TimeoutInjector,
};

pub struct RequestShaper {
    injectors: Vec<Box<dyn ContextInjector>>,
    codecs: Arc<CodecRegistry>,
}

impl RequestShaper {
    pub fn new(injectors: Vec<Box<dyn ContextInjector>>, codecs: Arc<CodecRegistry>) -> Self {
        Self { injectors, codecs }
    }

    /// The standard injector chain: timeout, secrets, request metadata.
    pub fn standard(timeout_ms: u64, secrets: Vec<String>, codecs: Arc<CodecRegistry>) -> Self {
        Self::new(
            vec![
                Box::new(TimeoutInjector::new(timeout_ms)),
                Box::new(EnvSecretInjector::new(secrets)),
                Box::new(RequestMetadataInjector),
            ],
            codecs,
        )
    }

    /// Builds the envelope for one inbound request.
    ///
    /// # Errors
    ///
    /// `IllegalState` from a duplicate context key, `UnsupportedMediaType`
    /// for an unknown content-type, `BadRequest` for an undecodable body.
    pub fn shape(&self, meta: &RequestMeta, body: &[u8]) -> Result<Envelope> {
        let mut context = Map::new();
        for injector in &self.injectors {
            injector.inject(meta, &mut context)?;
        }

        let payload = if carries_no_body(&meta.method) {
            Payload::Json(Value::Object(query_payload(&meta.uri)))
        } else {
            let media_type = meta
                .content_type()
                .filter(|value| !value.is_empty())
                .unwrap_or(DEFAULT_MEDIA_TYPE);
            self.codecs.read(media_type, body)?
        };

        Ok(Envelope::new(context, payload))
    }
}

fn carries_no_body(method: &str) -> bool {
    matches!(method, "GET" | "HEAD" | "OPTIONS")
}

/// Composes a payload object from the request's query string. The last
/// value wins per repeated key; each value is reinterpreted numerically
/// before falling back to a string.
fn query_payload(uri: &str) -> Map<String, Value> {
    let query = uri.splitn(2, '?').nth(1).unwrap_or("");
    let mut payload = Map::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        payload.insert(key.into_owned(), reinterpret(&value));
    }
    payload
}

fn reinterpret(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(raw.to_string())
}
