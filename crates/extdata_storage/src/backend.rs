//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level storage backend for ExtData.
///
/// Storage backends are **opaque blob stores** keyed by a virtual path such
/// as `PlayersData/1001/econ`. ExtData owns all payload interpretation -
/// backends do not understand record envelopes or versions.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the last successful `write` to that path
/// - `exists` is `true` exactly when `read` would succeed
/// - A failed `write` leaves any previous blob at that path intact
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Returns `true` if a blob is stored at `path`.
    ///
    /// Invalid paths are reported as absent.
    fn exists(&self, path: &str) -> bool;

    /// Reads the blob stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Nothing is stored at `path` ([`crate::StorageError::NotFound`])
    /// - The path is invalid
    /// - An I/O error occurs
    fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Writes `data` at `path`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or an I/O error occurs.
    fn write(&mut self, path: &str, data: &[u8]) -> StorageResult<()>;

    /// Lists every stored path that starts with `prefix`, sorted.
    ///
    /// An empty prefix lists everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be enumerated.
    fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        (**self).read(path)
    }

    fn write(&mut self, path: &str, data: &[u8]) -> StorageResult<()> {
        (**self).write(path, data)
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        (**self).list(prefix)
    }
}
