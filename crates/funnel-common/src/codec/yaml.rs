use serde_json::Value;

use crate::codec::{media_type_suffix, BodyCodec};
use crate::protocol::{FunnelError, Message, Payload, Result};

const MEDIA_TYPES: [&str; 3] = ["*/*", "application/yaml", "yaml"];

/// Codec for YAML-encoded bodies and messages.
///
/// YAML bodies are decoded into the same structured value shape as JSON,
/// so downstream consumers never see the difference.
pub struct YamlCodec;

impl BodyCodec for YamlCodec {
    fn content_type(&self) -> &'static str {
        "application/yaml"
    }

    fn can_read(&self, media_type: &str) -> bool {
        MEDIA_TYPES.contains(&media_type_suffix(media_type))
    }

    fn can_write(&self, media_type: &str) -> bool {
        MEDIA_TYPES.contains(&media_type_suffix(media_type))
    }

    fn read(&self, body: &[u8]) -> Result<Payload> {
        let value: Value =
            serde_yaml::from_slice(body).map_err(|e| FunnelError::BadRequest(e.to_string()))?;
        Ok(Payload::Json(value))
    }

    fn write(&self, message: &Message) -> Result<Vec<u8>> {
        Ok(serde_yaml::to_string(message)?.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_yaml_mapping() {
        let payload = YamlCodec.read(b"name: funnel\ncount: 2\n").unwrap();
        assert_eq!(payload, Payload::Json(json!({"name": "funnel", "count": 2})));
    }

    #[test]
    fn test_read_invalid_yaml_is_bad_request() {
        let err = YamlCodec.read(b"{ not: yaml: at all").unwrap_err();
        assert!(matches!(err, FunnelError::BadRequest(_)));
    }

    #[test]
    fn test_reads_suffixed_media_types() {
        assert!(YamlCodec.can_read("application/x-config+yaml"));
        assert!(!YamlCodec.can_read("application/json"));
    }
}
