//! # ExtData Testkit
//!
//! Test utilities for ExtData.
//!
//! This crate provides:
//! - Record fixtures and a [`TestHost`] wiring a manager to in-memory storage
//! - A [`FaultyBackend`] that fails selected writes
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use extdata_testkit::prelude::*;
//!
//! let mut host = TestHost::new();
//! host.load_or_default::<Wallet>(ECON, 1001).unwrap();
//! host.drain_all();
//!
//! assert!(host.stored::<Wallet>("PlayersData/1001/econ").is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use extdata_core::{
        BatchScope, Config, CoreError, DataManager, LoadOutcome, NamespaceRegistry, Namespaces,
        PrimaryKey, VersionNumber,
    };
    pub use extdata_storage::{InMemoryBackend, StorageBackend};
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
