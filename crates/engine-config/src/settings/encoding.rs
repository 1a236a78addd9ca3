//! Settings documents may be handed around base64 encoded, for example as a
//! single command-line or environment value.

use crate::error::ConfigError;
use base64::{Engine, engine::general_purpose::STANDARD};

pub fn encode(xml: &str) -> String {
    STANDARD.encode(xml.as_bytes())
}

/// Decodes an encoded document. Surrounding whitespace and line breaks, as
/// left by editors or `base64 -w 76`, are ignored.
pub fn decode(encoded: &str) -> Result<String, ConfigError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8(bytes)?)
}
