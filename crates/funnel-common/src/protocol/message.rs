//! Invocation Result Message
//!
//! The [`Message`] is the canonical invocation output returned to the
//! external caller: a context holding an optional classified [`Fault`] and
//! the [`Logs`] captured from the worker during the invocation, plus the
//! payload the worker returned (absent on error).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification of a fault surfaced to the caller.
///
/// These are the only kinds that appear in a `Message`: `InputError` for
/// problems with the caller's request, `FunctionError` for failures of the
/// user's function (including exceeded deadlines), `SystemError` for
/// everything the sidecar itself could not handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    InputError,
    FunctionError,
    SystemError,
}

/// An error surfaced in a `Message`'s context.
///
/// When the worker child reports a user-level error (HTTP status ≥ 400 with
/// a decodable body), the decoded fault is carried verbatim, stack trace
/// included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    #[serde(rename = "type")]
    pub kind: FaultKind,
    pub message: String,
    #[serde(default)]
    pub stacktrace: Vec<String>,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stacktrace: Vec::new(),
        }
    }
}

/// Lines captured from a worker's stdout and stderr during one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Logs {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// The context half of a `Message`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Fault>,
    pub logs: Option<Logs>,
}

/// The canonical invocation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub context: MessageContext,
    pub payload: Option<Value>,
}

impl Message {
    /// A successful result carrying the worker's payload.
    pub fn success(payload: Value, logs: Logs) -> Self {
        Self {
            context: MessageContext {
                error: None,
                logs: Some(logs),
            },
            payload: Some(payload),
        }
    }

    /// A failed invocation: classified fault plus whatever logs were captured.
    pub fn failure(fault: Fault, logs: Option<Logs>) -> Self {
        Self {
            context: MessageContext {
                error: Some(fault),
                logs,
            },
            payload: None,
        }
    }

    /// The short-circuit result for requests rejected before dispatch.
    pub fn input_error(message: impl Into<String>) -> Self {
        Self::failure(Fault::new(FaultKind::InputError, message), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_message_serialisation() {
        let message = Message::success(json!({"ok": true}), Logs::default());
        let wire = serde_json::to_value(&message).unwrap();
        assert_eq!(
            wire,
            json!({
                "context": {"logs": {"stdout": [], "stderr": []}},
                "payload": {"ok": true}
            })
        );
    }

    #[test]
    fn test_error_omitted_when_absent() {
        let message = Message::success(json!(1), Logs::default());
        let wire = serde_json::to_string(&message).unwrap();
        assert!(!wire.contains("\"error\""));
    }

    #[test]
    fn test_input_error_has_no_logs_or_payload() {
        let message = Message::input_error("bad content type");
        let wire = serde_json::to_value(&message).unwrap();
        assert_eq!(wire["context"]["error"]["type"], json!("InputError"));
        assert_eq!(wire["context"]["logs"], Value::Null);
        assert_eq!(wire["payload"], Value::Null);
    }

    #[test]
    fn test_fault_decodes_from_worker_body() {
        let body = r#"{"type":"FunctionError","message":"boom","stacktrace":["l1","l2"]}"#;
        let fault: Fault = serde_json::from_str(body).unwrap();
        assert_eq!(fault.kind, FaultKind::FunctionError);
        assert_eq!(fault.message, "boom");
        assert_eq!(fault.stacktrace, vec!["l1", "l2"]);
    }

    #[test]
    fn test_fault_decodes_without_stacktrace() {
        let body = r#"{"type":"SystemError","message":"down"}"#;
        let fault: Fault = serde_json::from_str(body).unwrap();
        assert!(fault.stacktrace.is_empty());
    }

    #[test]
    fn test_message_round_trip() {
        let message = Message::failure(
            Fault::new(FaultKind::SystemError, "connection refused"),
            Some(Logs {
                stdout: vec!["starting".into()],
                stderr: vec![],
            }),
        );
        let wire = serde_json::to_string(&message).unwrap();
        let back: Message = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, message);
    }
}
