use crate::codec::BodyCodec;
use crate::protocol::{FunnelError, Message, Payload, Result};

const MEDIA_TYPES: [&str; 2] = ["*/*", "text/plain"];

/// Codec for plain-text bodies.
///
/// Reads produce a string payload. Like [`super::Base64Codec`], a
/// structured `Message` cannot be rendered as plain text, so writes are
/// never offered.
pub struct PlainTextCodec;

impl BodyCodec for PlainTextCodec {
    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn can_read(&self, media_type: &str) -> bool {
        MEDIA_TYPES.contains(&media_type)
    }

    fn can_write(&self, _media_type: &str) -> bool {
        false
    }

    fn read(&self, body: &[u8]) -> Result<Payload> {
        Ok(Payload::Text(String::from_utf8_lossy(body).into_owned()))
    }

    fn write(&self, _message: &Message) -> Result<Vec<u8>> {
        Err(FunnelError::UnsupportedMediaType(
            self.content_type().to_string(),
        ))
    }
}
