//! # ExtData Storage
//!
//! Storage backend trait and implementations for ExtData.
//!
//! This crate provides the lowest-level storage abstraction for ExtData.
//! Storage backends are **opaque blob stores** addressed by a virtual,
//! `/`-separated path. They do not interpret the bytes they store.
//!
//! ## Design Principles
//!
//! - Backends are simple blob stores (exists, read, write)
//! - No knowledge of record envelopes, versions, or namespaces
//! - Must be `Send + Sync` so a data directory can be shared with tooling
//! - ExtData owns all payload interpretation
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - For persistent storage, one file per path
//!
//! ## Example
//!
//! ```rust
//! use extdata_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.write("PlayersData/1001/econ", b"hello world").unwrap();
//! assert!(backend.exists("PlayersData/1001/econ"));
//! assert_eq!(backend.read("PlayersData/1001/econ").unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;
mod path;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use path::validate_path;
