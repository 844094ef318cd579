//! EDS container codec
//!
//! An EDS file is a single line of text: a fixed 10-character tag followed by
//! the body. Two tags exist:
//!
//! | Tag          | Body                                              |
//! |--------------|---------------------------------------------------|
//! | `EDS0040000` | base64 of a zlib-compressed compact JSON document |
//! | `TXT0040000` | the JSON document as plain text                   |
//!
//! Decoding accepts both. Encoding always produces the compressed form; the
//! compressed bytes need not match the original file, only the decoded value.
//!
//! Files written by the legacy editor sometimes drop the trailing `=` padding,
//! so the decoder re-derives the padding from the body length.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::Value;

use crate::error::EdsError;

/// Tag of the compressed container variant.
pub const EDS_HEADER: &str = "EDS0040000";
/// Tag of the uncompressed container variant.
pub const TXT_HEADER: &str = "TXT0040000";

const HEADER_LEN: usize = 10;

/// Decode container text into the structured payload.
pub fn decode_str(raw: &str) -> Result<Value, EdsError> {
    let raw = raw.trim();
    if let Some(body) = raw.strip_prefix(EDS_HEADER) {
        let compressed = decode_base64_lenient(body)?;
        let mut json = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut json)
            .map_err(EdsError::Compression)?;
        Ok(serde_json::from_slice(&json)?)
    } else if let Some(body) = raw.strip_prefix(TXT_HEADER) {
        Ok(serde_json::from_str(body)?)
    } else {
        let tag: String = raw.chars().take(HEADER_LEN).collect();
        Err(EdsError::UnknownHeader(tag))
    }
}

/// Decode raw container bytes. The bytes must be UTF-8 text.
pub fn decode(bytes: &[u8]) -> Result<Value, EdsError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| EdsError::Malformed(format!("container is not UTF-8 text: {e}")))?;
    decode_str(text)
}

/// Encode a payload into the compressed container form.
pub fn encode(value: &Value) -> Result<String, EdsError> {
    let payload = serde_json::to_vec(value)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&payload).map_err(EdsError::Compression)?;
    let compressed = encoder.finish().map_err(EdsError::Compression)?;
    Ok(format!("{EDS_HEADER}{}", STANDARD.encode(compressed)))
}

/// Read and decode a container file.
pub fn read_container(path: impl AsRef<Path>) -> Result<Value, EdsError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| EdsError::io(path, e))?;
    decode(&bytes)
}

/// Encode a payload and write it as a container file.
pub fn write_container(path: impl AsRef<Path>, value: &Value) -> Result<(), EdsError> {
    let path = path.as_ref();
    let text = encode(value)?;
    fs::write(path, text).map_err(|e| EdsError::io(path, e))
}

fn decode_base64_lenient(body: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let mut cleaned: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let missing = (4 - cleaned.len() % 4) % 4;
    cleaned.extend(std::iter::repeat('=').take(missing));
    STANDARD.decode(cleaned)
}
