//! Format registry for format discovery and selection
//!
//! This module provides a centralized registry for all available formats.
//! Formats can be registered and retrieved by name.

use crate::error::EdsError;
use crate::format::Format;
use crate::formats::{EdsFormat, JsonFormat, TreevizFormat, YamlFormat};
use crate::ir::flat::FlatDocument;
use crate::schema::TypeDefaults;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of document formats
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::with_defaults()?;
/// let doc = registry.parse(&source, "eds")?;
/// let yaml = registry.serialize(&doc, "yaml")?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format
    ///
    /// If a format with the same name already exists, it will be replaced.
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    /// Get a format by name
    pub fn get(&self, name: &str) -> Result<&dyn Format, EdsError> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| EdsError::FormatNotFound(name.to_string()))
    }

    /// Check if a format exists
    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Detect format from filename based on file extension
    ///
    /// Returns the format name if a matching extension is found, or None otherwise.
    pub fn detect_format_from_filename(&self, filename: &str) -> Option<String> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())?;

        self.formats
            .values()
            .find(|format| format.file_extensions().contains(&extension))
            .map(|format| format.name().to_string())
    }

    /// Parse source text using the specified format
    pub fn parse(&self, source: &str, format: &str) -> Result<FlatDocument, EdsError> {
        self.parse_with_options(source, format, &HashMap::new())
    }

    /// Parse source text using the specified format and options
    pub fn parse_with_options(
        &self,
        source: &str,
        format: &str,
        options: &HashMap<String, String>,
    ) -> Result<FlatDocument, EdsError> {
        let fmt = self.get(format)?;
        if !fmt.supports_parsing() {
            return Err(EdsError::NotSupported(format!(
                "Format '{format}' does not support parsing"
            )));
        }
        fmt.parse_with_options(source, options)
    }

    /// Serialize a document using the specified format
    pub fn serialize(&self, doc: &FlatDocument, format: &str) -> Result<String, EdsError> {
        self.serialize_with_options(doc, format, &HashMap::new())
    }

    /// Serialize a document using the specified format and options
    pub fn serialize_with_options(
        &self,
        doc: &FlatDocument,
        format: &str,
        options: &HashMap<String, String>,
    ) -> Result<String, EdsError> {
        let fmt = self.get(format)?;
        if !fmt.supports_serialization() {
            return Err(EdsError::NotSupported(format!(
                "Format '{format}' does not support serialization"
            )));
        }
        fmt.serialize_with_options(doc, options)
    }

    /// Parse with one format and serialize with another
    pub fn convert(&self, source: &str, from: &str, to: &str) -> Result<String, EdsError> {
        let doc = self.parse(source, from)?;
        self.serialize(&doc, to)
    }

    /// Create a registry with the built-in formats around a given schema
    pub fn with_schema(schema: Arc<TypeDefaults>, include_metadata: bool) -> Self {
        let mut registry = Self::new();

        registry.register(EdsFormat);
        registry.register(JsonFormat);
        registry.register(TreevizFormat);
        registry.register(YamlFormat::new(schema).with_metadata(include_metadata));

        registry
    }

    /// Create a registry with the built-in formats and the bundled schema
    pub fn with_defaults() -> Result<Self, EdsError> {
        Ok(Self::with_schema(Arc::new(TypeDefaults::builtin()?), true))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
