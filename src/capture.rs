//! Capture validation and transport encoding

use base64::Engine as Base64Engine;

use crate::{Error, Result};

/// First four bytes of any PNG stream.
pub const PNG_SIGNATURE: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

/// Validate a raw snapshot: long enough to be a real capture and carrying the
/// PNG signature. Returns the bytes unchanged on success.
pub fn validate(bytes: Vec<u8>, min_len: usize) -> Result<Vec<u8>> {
    if bytes.len() < min_len {
        return Err(Error::Capture(format!(
            "snapshot truncated: {} bytes (minimum {min_len})",
            bytes.len()
        )));
    }
    if bytes.len() < 4 || bytes[0..4] != PNG_SIGNATURE {
        return Err(Error::Capture("snapshot is not a PNG".into()));
    }
    Ok(bytes)
}

/// Encode image bytes as standard padded base64.
///
/// The padding contract (output length a multiple of 4, `=`-padded) has been
/// violated by earlier renditions of this service, so it is enforced here and
/// surfaced as [`Error::Encoding`] rather than trusted.
pub fn encode(bytes: &[u8]) -> Result<String> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    if encoded.len() % 4 != 0 {
        return Err(Error::Encoding(format!(
            "base64 output length {} is not a multiple of 4",
            encoded.len()
        )));
    }
    Ok(encoded)
}

/// Decode a base64 string back into bytes.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| Error::Encoding(format!("invalid base64: {e}")))
}
