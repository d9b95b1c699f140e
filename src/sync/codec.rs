use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("content is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Encode text for the contents API.
pub fn encode_content(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode contents API payloads. The API wraps base64 at 60 columns, so
/// whitespace is dropped before decoding.
pub fn decode_content(encoded: &str) -> Result<String, DecodeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8(bytes)?)
}
