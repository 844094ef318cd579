//! Document loading and publishing pipeline.
//!
//! Bridges the format registry and file I/O: [`load`] reads and parses a file,
//! [`publish`] serializes a document and either returns the text or writes it.
//! EDS files are read and written through [`codec`] directly.
//!
//! For more control over the conversion process, use [`FormatRegistry`] directly.

use crate::codec;
use crate::error::EdsError;
use crate::ir::flat::FlatDocument;
use crate::registry::FormatRegistry;
use log::info;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const EDS_FORMAT: &str = "eds";

/// Specifies how to publish a document.
///
/// ```ignore
/// let spec = PublishSpec::new(&document, "yaml")
///     .with_output_path("huis.yaml")
///     .with_option("image-dir", "assets");
/// ```
///
/// If no output path is provided, the serialized text is returned in memory.
#[derive(Debug)]
pub struct PublishSpec<'a> {
    /// The document to convert.
    pub document: &'a FlatDocument,
    /// Target format name (e.g., "eds", "yaml").
    pub format: &'a str,
    /// Optional file path for writing output.
    pub output: Option<PathBuf>,
    /// Format-specific options (e.g., image extraction directory).
    pub options: HashMap<String, String>,
}

impl<'a> PublishSpec<'a> {
    pub fn new(document: &'a FlatDocument, format: &'a str) -> Self {
        Self {
            document,
            format,
            output: None,
            options: HashMap::new(),
        }
    }

    /// Sets the output file path. If provided, content is written to disk.
    pub fn with_output_path(mut self, path: impl AsRef<Path>) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// The output from a successful publish operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishArtifact {
    /// Content held in memory (no output path was given).
    InMemory(String),
    /// Path to the written file.
    File(PathBuf),
}

/// Read `path` and parse it with `format`.
pub fn load(
    registry: &FormatRegistry,
    path: &Path,
    format: &str,
    options: &HashMap<String, String>,
) -> Result<FlatDocument, EdsError> {
    if format == EDS_FORMAT {
        return FlatDocument::from_value(codec::read_container(path)?);
    }
    let source = fs::read_to_string(path).map_err(|e| EdsError::io(path, e))?;
    registry.parse_with_options(&source, format, options)
}

/// Serializes `spec.document` and writes it to `spec.output`, if any.
///
/// # Errors
///
/// Returns [`EdsError`] if the format is unknown or cannot serialize, if
/// serialization fails, or if the output file cannot be written.
pub fn publish(
    registry: &FormatRegistry,
    spec: PublishSpec<'_>,
) -> Result<PublishArtifact, EdsError> {
    match spec.output {
        Some(path) if spec.format == EDS_FORMAT => {
            codec::write_container(&path, &spec.document.to_value()?)?;
            info!("wrote {} as {}", path.display(), spec.format);
            Ok(PublishArtifact::File(path))
        }
        Some(path) => {
            let text =
                registry.serialize_with_options(spec.document, spec.format, &spec.options)?;
            fs::write(&path, text).map_err(|e| EdsError::io(&path, e))?;
            info!("wrote {} as {}", path.display(), spec.format);
            Ok(PublishArtifact::File(path))
        }
        None => {
            let text =
                registry.serialize_with_options(spec.document, spec.format, &spec.options)?;
            Ok(PublishArtifact::InMemory(text))
        }
    }
}
