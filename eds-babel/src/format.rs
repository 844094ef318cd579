//! Format trait definition
//!
//! This module defines the core Format trait that all format implementations must implement.
//! The trait provides a uniform interface for parsing and serializing installation documents.
//! Every format meets in the flat container model, [`FlatDocument`].

use crate::error::EdsError;
use crate::ir::flat::FlatDocument;
use std::collections::HashMap;

/// Trait for document formats
///
/// Implementors provide conversion between a textual representation and a
/// [`FlatDocument`]. Formats can support parsing, serialization, or both.
///
/// # Examples
///
/// ```ignore
/// struct MyFormat;
///
/// impl Format for MyFormat {
///     fn name(&self) -> &str {
///         "my-format"
///     }
///
///     fn supports_serialization(&self) -> bool {
///         true
///     }
///
///     fn serialize(&self, doc: &FlatDocument) -> Result<String, EdsError> {
///         Ok(format!("{} records", doc.data.len()))
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "eds", "yaml")
    fn name(&self) -> &str;

    /// Optional description of this format
    fn description(&self) -> &str {
        ""
    }

    /// File extensions associated with this format (e.g., ["eds"], ["yaml", "yml"])
    ///
    /// Returns a slice of file extensions without the leading dot.
    /// Used for automatic format detection from filenames.
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    /// Whether this format supports parsing (source → FlatDocument)
    fn supports_parsing(&self) -> bool {
        false
    }

    /// Whether this format supports serialization (FlatDocument → source)
    fn supports_serialization(&self) -> bool {
        false
    }

    /// Parse source text into a FlatDocument
    ///
    /// Default implementation returns NotSupported error.
    fn parse(&self, _source: &str) -> Result<FlatDocument, EdsError> {
        Err(EdsError::NotSupported(format!(
            "Format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Serialize a FlatDocument into source text
    ///
    /// Default implementation returns NotSupported error.
    fn serialize(&self, _doc: &FlatDocument) -> Result<String, EdsError> {
        Err(EdsError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }

    /// Parse, optionally using extra parameters such as `asset-dir`.
    ///
    /// Formats without parameters rely on the default implementation, which
    /// delegates to [`Format::parse`] and rejects any option.
    fn parse_with_options(
        &self,
        source: &str,
        options: &HashMap<String, String>,
    ) -> Result<FlatDocument, EdsError> {
        if options.is_empty() {
            self.parse(source)
        } else {
            Err(EdsError::NotSupported(format!(
                "Format '{}' does not support extra parameters",
                self.name()
            )))
        }
    }

    /// Serialize, optionally using extra parameters such as `image-dir`.
    fn serialize_with_options(
        &self,
        doc: &FlatDocument,
        options: &HashMap<String, String>,
    ) -> Result<String, EdsError> {
        if options.is_empty() {
            self.serialize(doc)
        } else {
            Err(EdsError::NotSupported(format!(
                "Format '{}' does not support extra parameters",
                self.name()
            )))
        }
    }
}
