//! # ExtData Core
//!
//! Shared persistence layer for plugin hosts.
//!
//! Independent plugins store structured records keyed by an entity id (a
//! player) or a free-form name, scoped by their own namespace, without each
//! reimplementing load/save/versioning. This crate provides:
//! - An in-memory [`Registry`] of loaded records
//! - A [`Reconciler`] that archives and replaces records written by another
//!   namespace version
//! - A tick-driven [`FlushScheduler`] that persists at most one record per tick
//! - The [`DataManager`] facade tying them to a [`StorageBackend`]
//! - A [`DataExtension`] shim for hosts with a per-frame callback
//!
//! ## Example
//!
//! ```rust
//! use extdata_core::{Config, DataManager, Namespaces, VersionNumber};
//! use extdata_storage::InMemoryBackend;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Serialize, Deserialize)]
//! struct Wallet {
//!     balance: i64,
//! }
//!
//! let mut namespaces = Namespaces::new();
//! namespaces.register("econ", VersionNumber::new(1, 0, 0));
//!
//! let mut manager = DataManager::new(Config::default(), InMemoryBackend::new(), namespaces);
//! manager.load_or_default::<Wallet>("econ", 1001).unwrap();
//! manager.get_mut::<Wallet>("econ", 1001).unwrap().balance += 50;
//! manager.save("econ", 1001).unwrap();
//!
//! while manager.is_flush_armed() {
//!     manager.drain_one();
//! }
//! ```
//!
//! [`StorageBackend`]: extdata_storage::StorageBackend

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
mod config;
mod error;
pub mod flush;
mod host;
mod key;
mod manager;
mod namespace;
pub mod reconcile;
mod registry;
mod version;

pub use codec::Record;
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use flush::{BatchFlags, BatchScope, DrainOutcome, FlushScheduler, WriteJob};
pub use host::DataExtension;
pub use key::{
    Category, PrimaryKey, BACKUP_DATA_FOLDER, PLAYERS_DATA_FOLDER, PLUGINS_DATA_FOLDER,
};
pub use manager::{DataManager, LoadOutcome};
pub use namespace::{NamespaceInfo, NamespaceRegistry, Namespaces};
pub use reconcile::{Reconciler, Reconciliation};
pub use registry::{Entry, Registry};
pub use version::{ParseVersionError, VersionNumber};

/// Crate version, as published.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the extension, used to detect outdated configuration.
pub const EXTENSION_VERSION: VersionNumber = VersionNumber::new(1, 0, 6);
