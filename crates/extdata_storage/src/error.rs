//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No blob is stored at the requested path.
    #[error("no data stored at {path}")]
    NotFound {
        /// The requested path.
        path: String,
    },

    /// The path is empty or contains an illegal segment.
    #[error("invalid storage path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why the path was rejected.
        reason: &'static str,
    },

    /// Another process holds the data directory lock.
    #[error("data directory locked: another process has exclusive access")]
    Locked,

    /// The stored data is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}

impl StorageError {
    /// Creates a not found error for `path`.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Returns `true` if this error reports a missing blob.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
