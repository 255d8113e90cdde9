//! Write queue and tick-driven flush scheduler.
//!
//! Saves never touch storage directly. They enqueue a [`WriteJob`] holding an
//! encoded snapshot of the record, and the host calls
//! [`FlushScheduler::drain_one`] once per tick to persist at most one job.
//! This bounds the storage cost of a tick no matter how large a bulk save is.
//!
//! The scheduler is *armed* while it has work. Hosts should stop invoking the
//! tick hook once it disarms.
//!
//! A job whose write fails is logged and dropped. There is no retry and the
//! caller that queued it is not notified.

use crate::error::{CoreError, CoreResult};
use crate::key::Category;
use extdata_storage::StorageBackend;
use std::collections::VecDeque;
use std::fmt;
use tracing::{trace, warn};

/// The scope of a bulk save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchScope {
    /// Every entity-scoped record.
    Entities,
    /// Every named record.
    Named,
}

impl BatchScope {
    /// Returns the registry category covered by this scope.
    #[must_use]
    pub fn category(self) -> Category {
        match self {
            Self::Entities => Category::Entity,
            Self::Named => Category::Named,
        }
    }
}

impl fmt::Display for BatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entities => f.write_str("entity"),
            Self::Named => f.write_str("named"),
        }
    }
}

/// In-progress markers for bulk saves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchFlags {
    /// Saving all entity data.
    pub entities: bool,
    /// Saving all named data.
    pub named: bool,
}

impl BatchFlags {
    /// Returns whether `scope` is marked.
    #[must_use]
    pub fn is_set(&self, scope: BatchScope) -> bool {
        match scope {
            BatchScope::Entities => self.entities,
            BatchScope::Named => self.named,
        }
    }

    /// Returns `true` if any scope is marked.
    #[must_use]
    pub fn any(&self) -> bool {
        self.entities || self.named
    }

    fn mark(&mut self, scope: BatchScope) {
        match scope {
            BatchScope::Entities => self.entities = true,
            BatchScope::Named => self.named = true,
        }
    }
}

/// A pending write: a storage path and an immutable encoded snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteJob {
    path: String,
    blob: Vec<u8>,
}

impl WriteJob {
    /// Creates a job.
    #[must_use]
    pub fn new(path: impl Into<String>, blob: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            blob,
        }
    }

    /// Returns the storage path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the encoded snapshot.
    #[must_use]
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }
}

/// What one [`FlushScheduler::drain_one`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    /// The tick this outcome belongs to.
    pub tick: u64,
    /// Path persisted during this tick.
    pub written: Option<String>,
    /// Path whose write failed and was dropped during this tick.
    pub dropped: Option<String>,
    /// Batch markers cleared because the queue ran dry.
    pub batches_cleared: BatchFlags,
    /// Whether the scheduler disarmed at the end of this tick.
    pub disarmed: bool,
}

impl DrainOutcome {
    /// Creates an outcome for a tick on which nothing happened.
    #[must_use]
    pub fn idle(tick: u64) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    /// Returns `true` if the tick did nothing.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.written.is_none()
            && self.dropped.is_none()
            && !self.batches_cleared.any()
            && !self.disarmed
    }
}

/// FIFO of pending writes drained one job per tick.
#[derive(Debug, Default)]
pub struct FlushScheduler {
    queue: VecDeque<WriteJob>,
    armed: bool,
    batch: BatchFlags,
    written: u64,
    dropped: u64,
}

impl FlushScheduler {
    /// Creates an empty, disarmed scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job and arms the drain.
    pub fn enqueue(&mut self, job: WriteJob) {
        trace!(path = %job.path, pending = self.queue.len() + 1, "queued write");
        self.queue.push_back(job);
        self.ensure_flush_active();
    }

    /// Arms the drain. Idempotent.
    pub fn ensure_flush_active(&mut self) {
        self.armed = true;
    }

    /// Returns whether the host should keep invoking [`Self::drain_one`].
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Returns the number of queued jobs.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns the queued jobs in drain order.
    pub fn jobs(&self) -> impl Iterator<Item = &WriteJob> {
        self.queue.iter()
    }

    /// Returns the current batch markers.
    #[must_use]
    pub fn batch_flags(&self) -> BatchFlags {
        self.batch
    }

    /// Marks a bulk save of `scope` as in progress.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BatchInProgress`] if `scope` is already marked.
    pub fn begin_batch(&mut self, scope: BatchScope) -> CoreResult<()> {
        if self.batch.is_set(scope) {
            return Err(CoreError::BatchInProgress { scope });
        }
        self.batch.mark(scope);
        self.ensure_flush_active();
        Ok(())
    }

    /// Returns the number of jobs persisted so far.
    #[must_use]
    pub fn written_count(&self) -> u64 {
        self.written
    }

    /// Returns the number of jobs dropped after a failed write.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Runs one tick of the drain.
    ///
    /// Persists the oldest job, if any. Once the queue is empty the drain is
    /// complete: batch markers are cleared and the scheduler disarms.
    pub fn drain_one<B: StorageBackend + ?Sized>(
        &mut self,
        tick: u64,
        backend: &mut B,
    ) -> DrainOutcome {
        let mut outcome = DrainOutcome::idle(tick);
        if !self.armed {
            return outcome;
        }

        if let Some(job) = self.queue.pop_front() {
            match backend.write(&job.path, &job.blob) {
                Ok(()) => {
                    self.written += 1;
                    trace!(tick, path = %job.path, "flushed write");
                    outcome.written = Some(job.path);
                }
                Err(e) => {
                    self.dropped += 1;
                    warn!(tick, path = %job.path, error = %e, "write failed, dropping job");
                    outcome.dropped = Some(job.path);
                }
            }
        }

        if self.queue.is_empty() {
            outcome.batches_cleared = std::mem::take(&mut self.batch);
            self.armed = false;
            outcome.disarmed = true;
        }
        outcome
    }
}
