use serde_json::Value;

use crate::codec::{media_type_suffix, BodyCodec};
use crate::protocol::{FunnelError, Message, Payload, Result};

const MEDIA_TYPES: [&str; 3] = ["*/*", "application/json", "json"];

/// Codec for JSON-encoded bodies and messages.
pub struct JsonCodec;

impl BodyCodec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn can_read(&self, media_type: &str) -> bool {
        MEDIA_TYPES.contains(&media_type_suffix(media_type))
    }

    fn can_write(&self, media_type: &str) -> bool {
        MEDIA_TYPES.contains(&media_type_suffix(media_type))
    }

    fn read(&self, body: &[u8]) -> Result<Payload> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| FunnelError::BadRequest(e.to_string()))?;
        Ok(Payload::Json(value))
    }

    fn write(&self, message: &Message) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(message)?)
    }
}
