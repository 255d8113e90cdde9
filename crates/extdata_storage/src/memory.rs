//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use crate::path::validate_path;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory storage backend.
///
/// This backend stores all blobs in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral hosts that don't need persistence
///
/// Every successful write is also appended to a journal, so tests can
/// assert on the exact order in which paths were persisted.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use extdata_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// backend.write("PluginsData/econ/bank", b"state").unwrap();
/// assert_eq!(backend.journal(), vec!["PluginsData/econ/bank".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
    journal: RwLock<Vec<String>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing blobs.
    ///
    /// Seeded blobs do not appear in the journal. Useful for testing
    /// load paths against stored data.
    #[must_use]
    pub fn with_blobs<I, P>(blobs: I) -> Self
    where
        I: IntoIterator<Item = (P, Vec<u8>)>,
        P: Into<String>,
    {
        Self {
            blobs: RwLock::new(blobs.into_iter().map(|(p, b)| (p.into(), b)).collect()),
            journal: RwLock::new(Vec::new()),
        }
    }

    /// Returns the paths written so far, in write order.
    #[must_use]
    pub fn journal(&self) -> Vec<String> {
        self.journal.read().clone()
    }

    /// Returns the number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.journal.read().len()
    }

    /// Returns the number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Clears all blobs and the journal.
    pub fn clear(&mut self) {
        self.blobs.write().clear();
        self.journal.write().clear();
    }
}

impl StorageBackend for InMemoryBackend {
    fn exists(&self, path: &str) -> bool {
        self.blobs.read().contains_key(path)
    }

    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        validate_path(path)?;
        self.blobs
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path))
    }

    fn write(&mut self, path: &str, data: &[u8]) -> StorageResult<()> {
        validate_path(path)?;
        self.blobs.write().insert(path.to_string(), data.to_vec());
        self.journal.write().push(path.to_string());
        Ok(())
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .blobs
            .read()
            .keys()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect())
    }
}
