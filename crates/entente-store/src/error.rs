//! Error types for the persistence layer.
//!
//! All errors are propagated via [`StoreError`], which carries the path of
//! the file involved so that a logged failure can be traced to disk.

use std::path::PathBuf;

/// Errors that can occur while reading or writing persisted state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A file held JSON that could not be decoded, or a record could not
    /// be encoded.
    #[error("Serialization error on {path}: {source}")]
    Serialization {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A nation identifier cannot be used as a file name.
    #[error("Invalid nation identifier for storage: {0:?}")]
    InvalidNationId(String),
}

impl StoreError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON error with the path it concerns.
    pub fn serialization(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Serialization {
            path: path.into(),
            source,
        }
    }
}
