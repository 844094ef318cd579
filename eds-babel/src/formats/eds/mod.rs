//! EDS container format
//!
//! Reads both container variants and always writes the compressed one. See
//! [`crate::codec`] for the byte layout.

use crate::codec;
use crate::error::EdsError;
use crate::format::Format;
use crate::ir::flat::FlatDocument;

/// Format implementation for `.eds` containers
#[derive(Debug, Default, Clone, Copy)]
pub struct EdsFormat;

impl Format for EdsFormat {
    fn name(&self) -> &str {
        "eds"
    }

    fn description(&self) -> &str {
        "EDS installation container (compressed or plain JSON payload)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["eds"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<FlatDocument, EdsError> {
        FlatDocument::from_value(codec::decode_str(source)?)
    }

    fn serialize(&self, doc: &FlatDocument) -> Result<String, EdsError> {
        codec::encode(&doc.to_value()?)
    }
}
