//! Error types for ExtData core.

use crate::flush::BatchScope;
use crate::key::PrimaryKey;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in ExtData core operations.
///
/// Every variant is recoverable by the caller. None of them leaves the
/// registry or the write queue in a partially updated state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] extdata_storage::StorageError),

    /// A record could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// No record is loaded for the requested key.
    #[error("data not loaded for {target}")]
    NotLoaded {
        /// The key (and namespace, if any) that was looked up.
        target: String,
    },

    /// A record is already loaded for the key.
    #[error("data already loaded for {target}")]
    AlreadyLoaded {
        /// The occupied key and namespace.
        target: String,
    },

    /// `create` was called without a record.
    #[error("data not created for {target}: record is missing")]
    NullRecord {
        /// The key and namespace that were targeted.
        target: String,
    },

    /// Stored data exists but could not be read.
    #[error("failed to load {path}: {reason}")]
    LoadFailed {
        /// Storage path of the record.
        path: String,
        /// Why loading failed.
        reason: String,
    },

    /// The namespace or record name cannot be used as a storage path segment.
    #[error("invalid key {target}: {reason}")]
    InvalidKey {
        /// The key and namespace.
        target: String,
        /// Why the key was rejected.
        reason: &'static str,
    },

    /// The owning namespace is not registered or not active.
    #[error("namespace {namespace:?} does not exist or is not loaded")]
    InactiveNamespace {
        /// The namespace.
        namespace: String,
    },

    /// The manager has been halted; no further mutation is possible.
    #[error("data manager is halted")]
    Halted,

    /// A bulk save of the same scope has not finished draining yet.
    #[error("saving all {scope} data is already in progress")]
    BatchInProgress {
        /// The busy scope.
        scope: BatchScope,
    },

    /// The record is stored under a different type than requested.
    #[error("data for {target} is a {stored}, not a {requested}")]
    TypeMismatch {
        /// The key and namespace.
        target: String,
        /// Type name the caller asked for.
        requested: &'static str,
        /// Type name of the loaded record.
        stored: &'static str,
    },
}

fn describe(key: &PrimaryKey, namespace: &str) -> String {
    format!("{key} in namespace {namespace:?}")
}

impl CoreError {
    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates a not loaded error for one namespace entry.
    pub fn not_loaded(key: &PrimaryKey, namespace: &str) -> Self {
        Self::NotLoaded {
            target: describe(key, namespace),
        }
    }

    /// Creates a not loaded error for a whole primary key.
    pub fn key_not_loaded(key: &PrimaryKey) -> Self {
        Self::NotLoaded {
            target: key.to_string(),
        }
    }

    /// Creates a not loaded error for a namespace with no records.
    pub fn namespace_not_loaded(namespace: &str) -> Self {
        Self::NotLoaded {
            target: format!("namespace {namespace:?}"),
        }
    }

    /// Creates an already loaded error.
    pub fn already_loaded(key: &PrimaryKey, namespace: &str) -> Self {
        Self::AlreadyLoaded {
            target: describe(key, namespace),
        }
    }

    /// Creates a null record error.
    pub fn null_record(key: &PrimaryKey, namespace: &str) -> Self {
        Self::NullRecord {
            target: describe(key, namespace),
        }
    }

    /// Creates a load failed error.
    pub fn load_failed(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::LoadFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(key: &PrimaryKey, namespace: &str, reason: &'static str) -> Self {
        Self::InvalidKey {
            target: describe(key, namespace),
            reason,
        }
    }

    /// Creates an inactive namespace error.
    pub fn inactive_namespace(namespace: impl Into<String>) -> Self {
        Self::InactiveNamespace {
            namespace: namespace.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(
        key: &PrimaryKey,
        namespace: &str,
        requested: &'static str,
        stored: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            target: describe(key, namespace),
            requested,
            stored,
        }
    }

    /// Returns `true` for errors that refuse an operation because of the
    /// manager's state rather than reporting a fault.
    #[must_use]
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            Self::Halted
                | Self::BatchInProgress { .. }
                | Self::AlreadyLoaded { .. }
                | Self::InactiveNamespace { .. }
        )
    }
}
