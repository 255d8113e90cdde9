//! Record fixtures and manager harnesses.
//!
//! Provides two record types used across the scenario tests and a
//! [`TestHost`] that owns a manager over an [`InMemoryBackend`] with the
//! fixture namespaces registered.

use extdata_core::{codec, Config, DataManager, DrainOutcome, Namespaces, VersionNumber};
use extdata_storage::{FileBackend, InMemoryBackend, StorageBackend};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

/// Namespace of the economy fixture plugin.
pub const ECON: &str = "econ";
/// Version the economy plugin declares.
pub const ECON_VERSION: VersionNumber = VersionNumber::new(1, 0, 0);

/// Namespace of the homes fixture plugin.
pub const HOMES: &str = "homes";
/// Version the homes plugin declares.
pub const HOMES_VERSION: VersionNumber = VersionNumber::new(2, 1, 0);

/// A per-player balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Current balance.
    pub balance: i64,
}

impl Wallet {
    /// Creates a wallet holding `balance`.
    pub fn with_balance(balance: i64) -> Self {
        Self { balance }
    }
}

/// A named settings record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Server-wide title.
    pub title: String,
    /// Maximum homes per player.
    pub max_homes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "server".to_string(),
            max_homes: 3,
        }
    }
}

/// Namespaces with [`ECON`] and [`HOMES`] registered and active.
pub fn fixture_namespaces() -> Namespaces {
    let mut namespaces = Namespaces::new();
    namespaces.register(ECON, ECON_VERSION);
    namespaces.register(HOMES, HOMES_VERSION);
    namespaces
}

/// Encodes `record` the way the manager stores it.
pub fn stored_blob<T: Serialize>(version: VersionNumber, record: &T) -> Vec<u8> {
    codec::encode_record(version, record).expect("fixture record must encode")
}

/// A manager over a generic backend with the fixture namespaces.
pub struct TestHost<B = InMemoryBackend> {
    /// The manager under test.
    pub manager: DataManager<B, Namespaces>,
}

impl TestHost<InMemoryBackend> {
    /// Creates a host with default config and empty storage.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a host with `config` and empty storage.
    pub fn with_config(config: Config) -> Self {
        Self::with_backend(config, InMemoryBackend::new())
    }

    /// Creates a host whose storage already holds `blobs`.
    pub fn seeded<I>(config: Config, blobs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Vec<u8>)>,
    {
        Self::with_backend(config, InMemoryBackend::with_blobs(blobs))
    }
}

impl Default for TestHost<InMemoryBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: StorageBackend> TestHost<B> {
    /// Creates a host over `backend`.
    pub fn with_backend(config: Config, backend: B) -> Self {
        Self {
            manager: DataManager::new(config, backend, fixture_namespaces()),
        }
    }

    /// Ticks until the scheduler disarms. Returns the outcome of every tick.
    pub fn drain_all(&mut self) -> Vec<DrainOutcome> {
        let mut outcomes = Vec::new();
        while self.manager.is_flush_armed() {
            outcomes.push(self.manager.drain_one());
        }
        outcomes
    }

    /// Decodes the record stored at `path`, if any.
    pub fn stored<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let blob = self.manager.backend().read(path).ok()?;
        codec::decode_record(&blob).ok().map(|(_, record)| record)
    }

    /// Returns the version of the record stored at `path`, if any.
    pub fn stored_version(&self, path: &str) -> Option<VersionNumber> {
        let blob = self.manager.backend().read(path).ok()?;
        codec::read_version(&blob).ok()
    }
}

impl<B> std::ops::Deref for TestHost<B> {
    type Target = DataManager<B, Namespaces>;

    fn deref(&self) -> &Self::Target {
        &self.manager
    }
}

impl<B> std::ops::DerefMut for TestHost<B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.manager
    }
}

/// A data directory that is removed when dropped.
pub struct TempDataDir {
    dir: TempDir,
}

impl TempDataDir {
    /// Creates an empty temporary directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Opens a [`FileBackend`] rooted at the directory.
    pub fn open(&self) -> FileBackend {
        FileBackend::open(self.dir.path()).expect("Failed to open file backend")
    }

    /// Returns the directory path.
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl Default for TempDataDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_registers_fixture_namespaces() {
        let host = TestHost::new();
        assert!(!host.is_flush_armed());
        assert_eq!(host.namespaces().get(ECON).map(|i| i.version), Some(ECON_VERSION));
        assert_eq!(host.namespaces().get(HOMES).map(|i| i.version), Some(HOMES_VERSION));
    }

    #[test]
    fn seeded_host_reads_back_fixture_blobs() {
        let blob = stored_blob(ECON_VERSION, &Wallet::with_balance(5));
        let host = TestHost::seeded(Config::default(), [("PlayersData/1/econ", blob)]);

        assert_eq!(host.stored::<Wallet>("PlayersData/1/econ"), Some(Wallet::with_balance(5)));
        assert_eq!(host.stored_version("PlayersData/1/econ"), Some(ECON_VERSION));
    }
}
