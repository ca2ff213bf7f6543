use thiserror::Error;

use crate::protocol::message::Fault;

/// Workspace-wide error type.
///
/// Variants map one-to-one onto the failure taxonomy of the sidecar:
/// configuration and construction problems (`IllegalArgument`,
/// `IllegalState`), request shaping problems (`UnsupportedMediaType`,
/// `BadRequest`) and invocation problems (`Timeout`, `ConnectionRefused`,
/// `FunctionServer`, `InvalidResponsePayload`, `UnknownSystem`).
#[derive(Error, Debug)]
pub enum FunnelError {
    #[error("the argument is illegal or inappropriate: {0}")]
    IllegalArgument(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("the request body is invalid: {0}")]
    BadRequest(String),

    #[error("the invocation exceeded the timeout: {0}ms")]
    Timeout(u64),

    #[error("the local function server at port {0} refused the connection")]
    ConnectionRefused(u16),

    #[error("the function server reported an error: {}", .0.message)]
    FunctionServer(Fault),

    #[error("unable to decode the response payload: {0}")]
    InvalidResponsePayload(String),

    #[error("unknown system error: {0}")]
    UnknownSystem(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, FunnelError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::FaultKind;

    #[test]
    fn test_timeout_error_message() {
        let err = FunnelError::Timeout(250);
        assert_eq!(err.to_string(), "the invocation exceeded the timeout: 250ms");
    }

    #[test]
    fn test_connection_refused_carries_port() {
        let err = FunnelError::ConnectionRefused(9000);
        assert!(err.to_string().contains("9000"));
    }

    #[test]
    fn test_function_server_error_surfaces_fault_message() {
        let fault = Fault::new(FaultKind::FunctionError, "boom");
        let err = FunnelError::FunctionServer(fault);
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: FunnelError = io.into();
        assert!(matches!(err, FunnelError::Io(_)));
    }
}
