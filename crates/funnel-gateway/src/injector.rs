//! Context Injectors
//!
//! Before a request body is decoded, an ordered chain of injectors
//! populates the envelope's context. Each injector owns exactly one
//! well-known key; finding its key already present is an invariant
//! violation of the chain (not of user input) and fails with
//! `IllegalState`.
//!
//! Every injector is handed a snapshot of the inbound HTTP request, which
//! is how request-aware injectors (like [`RequestMetadataInjector`])
//! observe it.

use std::collections::HashMap;

use axum::http::request::Parts;
use funnel_common::protocol::{FunnelError, Result, REQUEST_KEY, SECRETS_KEY, TIMEOUT_KEY};
use serde_json::{json, Map, Value};

/// Environment variable prefix for secret values.
const SECRET_ENV_PREFIX: &str = "d_secret_";

/// Snapshot of the inbound HTTP request.
///
/// Header names are lowercase; repeated headers keep every value in
/// arrival order.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub method: String,
    pub uri: String,
    pub headers: HashMap<String, Vec<String>>,
}

impl RequestMeta {
    pub fn from_parts(parts: &Parts) -> Self {
        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in &parts.headers {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        Self {
            method: parts.method.as_str().to_string(),
            uri: parts.uri.to_string(),
            headers,
        }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn accept(&self) -> Option<&str> {
        self.header("accept")
    }
}

/// Writes exactly one well-known key into an envelope's context.
pub trait ContextInjector: Send + Sync {
    fn inject(&self, meta: &RequestMeta, context: &mut Map<String, Value>) -> Result<()>;
}

fn reject_duplicate(context: &Map<String, Value>, key: &str) -> Result<()> {
    if context.contains_key(key) {
        return Err(FunnelError::IllegalState(format!(
            "context key {key:?} already present"
        )));
    }
    Ok(())
}

/// Injects the default per-invocation timeout under `timeout`.
pub struct TimeoutInjector {
    timeout_ms: u64,
}

impl TimeoutInjector {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }
}

impl ContextInjector for TimeoutInjector {
    fn inject(&self, _meta: &RequestMeta, context: &mut Map<String, Value>) -> Result<()> {
        reject_duplicate(context, TIMEOUT_KEY)?;
        context.insert(TIMEOUT_KEY.into(), json!(self.timeout_ms));
        Ok(())
    }
}

/// Injects the configured secrets under `secrets`, each resolved from the
/// environment variable `d_secret_<name>` at injection time. Missing
/// variables resolve to an empty value.
pub struct EnvSecretInjector {
    names: Vec<String>,
}

impl EnvSecretInjector {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl ContextInjector for EnvSecretInjector {
    fn inject(&self, _meta: &RequestMeta, context: &mut Map<String, Value>) -> Result<()> {
        reject_duplicate(context, SECRETS_KEY)?;
        let secrets: Map<String, Value> = self
            .names
            .iter()
            .map(|name| {
                let value =
                    std::env::var(format!("{SECRET_ENV_PREFIX}{name}")).unwrap_or_default();
                (name.clone(), Value::String(value))
            })
            .collect();
        context.insert(SECRETS_KEY.into(), Value::Object(secrets));
        Ok(())
    }
}

/// Injects a snapshot of the inbound request under `request`.
pub struct RequestMetadataInjector;

impl ContextInjector for RequestMetadataInjector {
    fn inject(&self, meta: &RequestMeta, context: &mut Map<String, Value>) -> Result<()> {
        reject_duplicate(context, REQUEST_KEY)?;
        context.insert(
            REQUEST_KEY.into(),
            json!({
                "method": meta.method,
                "uri": meta.uri,
                "header": meta.headers,
            }),
        );
        Ok(())
    }
}
