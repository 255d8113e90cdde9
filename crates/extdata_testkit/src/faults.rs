//! Fault injection for storage backends.
//!
//! [`FaultyBackend`] wraps another backend and fails writes on demand, so
//! tests can observe how the flush scheduler and the reconciler react to
//! storage errors without touching the file system.

use extdata_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};
use std::io;

/// A backend that fails selected writes.
///
/// Reads, `exists` and `list` always pass through.
#[derive(Debug)]
pub struct FaultyBackend<B = InMemoryBackend> {
    inner: B,
    failing_prefixes: Vec<String>,
    fail_next: usize,
    failed: Vec<String>,
}

impl FaultyBackend<InMemoryBackend> {
    /// Wraps an empty in-memory backend.
    pub fn new() -> Self {
        Self::wrap(InMemoryBackend::new())
    }
}

impl Default for FaultyBackend<InMemoryBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: StorageBackend> FaultyBackend<B> {
    /// Wraps `inner`. No writes fail until configured.
    pub fn wrap(inner: B) -> Self {
        Self {
            inner,
            failing_prefixes: Vec::new(),
            fail_next: 0,
            failed: Vec::new(),
        }
    }

    /// Fails every write whose path starts with `prefix`.
    #[must_use]
    pub fn fail_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.failing_prefixes.push(prefix.into());
        self
    }

    /// Fails the next `count` writes regardless of path.
    pub fn fail_next_writes(&mut self, count: usize) {
        self.fail_next = count;
    }

    /// Stops failing writes.
    pub fn heal(&mut self) {
        self.failing_prefixes.clear();
        self.fail_next = 0;
    }

    /// Returns the paths of writes that were failed, in order.
    pub fn failed_writes(&self) -> &[String] {
        &self.failed
    }

    /// Returns the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn should_fail(&mut self, path: &str) -> bool {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return true;
        }
        self.failing_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

impl<B: StorageBackend> StorageBackend for FaultyBackend<B> {
    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }

    fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.inner.read(path)
    }

    fn write(&mut self, path: &str, data: &[u8]) -> StorageResult<()> {
        if self.should_fail(path) {
            self.failed.push(path.to_string());
            return Err(StorageError::Io(io::Error::other(format!(
                "injected write failure at {path}"
            ))));
        }
        self.inner.write(path, data)
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.list(prefix)
    }
}
