//! Error types for conversion operations

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a conversion run.
///
/// Conditions that only affect a single site-plan layer (a missing image asset,
/// an unresolved reference) are not represented here; they are logged and the
/// run continues.
#[derive(Debug, Error)]
pub enum EdsError {
    /// The container did not start with one of the known 10-character tags
    #[error("unrecognized container header '{0}'")]
    UnknownHeader(String),

    /// The compressed body was not valid base64
    #[error("invalid container body: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The compressed body did not inflate (or, when encoding, deflate)
    #[error("container compression failed: {0}")]
    Compression(#[source] std::io::Error),

    /// Structured JSON text could not be read or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authored YAML text could not be read or written
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading or writing a file failed
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The type-defaults schema could not be loaded
    #[error("schema error: {0}")]
    Schema(String),

    /// The payload parsed but does not have the shape of a flat document
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Format not found in registry
    #[error("format '{0}' not found")]
    FormatNotFound(String),

    /// Format does not support the requested direction
    #[error("operation not supported: {0}")]
    NotSupported(String),
}

impl EdsError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EdsError::Io {
            path: path.into(),
            source,
        }
    }
}
