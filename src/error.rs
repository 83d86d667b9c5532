//! Error types for schema construction and loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while constructing a [`SchemaDocument`](crate::SchemaDocument).
///
/// The owning caller is expected to discard the document entirely; there is
/// no partially built schema.
#[derive(Debug, Error)]
pub enum SchemaValidationError {
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("schema is missing required field \"{field}\"")]
    MissingField { field: &'static str },
}

impl SchemaValidationError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading a schema document from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Schema errors (exit code 2)
    #[error(transparent)]
    Invalid(#[from] SchemaValidationError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::Invalid(e) => e.exit_code(),
        }
    }
}
