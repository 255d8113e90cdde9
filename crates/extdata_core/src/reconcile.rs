//! Schema version reconciliation.
//!
//! When a stored record was written under a different namespace version than
//! the one currently active, the stored bytes are archived unmodified under
//! [`BACKUP_DATA_FOLDER`] and the caller replaces the record with a fresh
//! default. There is no migration path: staleness is resolved by replacement.

use crate::error::{CoreError, CoreResult};
use crate::key::BACKUP_DATA_FOLDER;
use crate::version::VersionNumber;
use extdata_storage::StorageBackend;
use tracing::warn;

/// What to do with a record read from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Load the stored record as-is.
    Accept,
    /// Archive the stored record and create a fresh one.
    Replace,
}

/// Returns the path a stale record at `path` is archived to.
#[must_use]
pub fn backup_path(path: &str) -> String {
    format!("{BACKUP_DATA_FOLDER}{path}")
}

/// Applies the version-check policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciler {
    check_versions: bool,
}

impl Reconciler {
    /// Creates a reconciler; with `check_versions` off every version is accepted.
    #[must_use]
    pub const fn new(check_versions: bool) -> Self {
        Self { check_versions }
    }

    /// Returns whether version checking is enabled.
    #[must_use]
    pub const fn check_versions(&self) -> bool {
        self.check_versions
    }

    /// Decides between accepting and replacing a stored record.
    ///
    /// Any inequality counts, older or newer.
    #[must_use]
    pub fn reconcile(&self, stored: VersionNumber, current: VersionNumber) -> Reconciliation {
        if self.check_versions && stored != current {
            Reconciliation::Replace
        } else {
            Reconciliation::Accept
        }
    }

    /// Writes `blob` unmodified to the backup path of `path`.
    ///
    /// The write is synchronous: the caller must not overwrite `path` unless
    /// this succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LoadFailed`] if the backup could not be written.
    pub fn archive<B: StorageBackend + ?Sized>(
        &self,
        backend: &mut B,
        path: &str,
        blob: &[u8],
    ) -> CoreResult<String> {
        let backup = backup_path(path);
        backend
            .write(&backup, blob)
            .map_err(|e| {
                CoreError::load_failed(path, format!("could not archive stale data: {e}"))
            })?;
        warn!(
            path,
            backup = %backup,
            "backup created, data file is outdated; created new data file"
        );
        Ok(backup)
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(true)
    }
}
