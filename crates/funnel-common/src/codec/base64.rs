use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::codec::BodyCodec;
use crate::protocol::{FunnelError, Message, Payload, Result};

const MEDIA_TYPES: [&str; 2] = ["*/*", "application/base64"];

/// Codec for standard-base64 bodies.
///
/// Reads decode into a raw byte sequence. A structured `Message` has no
/// base64 representation, so this codec never participates in the write
/// path.
pub struct Base64Codec;

impl BodyCodec for Base64Codec {
    fn content_type(&self) -> &'static str {
        "application/base64"
    }

    fn can_read(&self, media_type: &str) -> bool {
        MEDIA_TYPES.contains(&media_type)
    }

    fn can_write(&self, _media_type: &str) -> bool {
        false
    }

    fn read(&self, body: &[u8]) -> Result<Payload> {
        let trimmed = body.trim_ascii();
        let bytes = BASE64
            .decode(trimmed)
            .map_err(|e| FunnelError::BadRequest(e.to_string()))?;
        Ok(Payload::Bytes(bytes))
    }

    fn write(&self, _message: &Message) -> Result<Vec<u8>> {
        Err(FunnelError::UnsupportedMediaType(
            self.content_type().to_string(),
        ))
    }
}
