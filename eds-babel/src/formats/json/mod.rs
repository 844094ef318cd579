//! JSON payload format
//!
//! The decoded container payload as pretty-printed JSON. Useful for diffing
//! two containers or hand-editing one; parsing accepts the same shape back.

use crate::error::EdsError;
use crate::format::Format;
use crate::ir::flat::FlatDocument;

/// Format implementation for the raw container payload
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Decoded container payload as JSON"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<FlatDocument, EdsError> {
        FlatDocument::from_value(serde_json::from_str(source)?)
    }

    fn serialize(&self, doc: &FlatDocument) -> Result<String, EdsError> {
        Ok(serde_json::to_string_pretty(&doc.to_value()?)?)
    }
}
