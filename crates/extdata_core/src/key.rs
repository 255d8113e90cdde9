//! Registry keys and the storage layout they map to.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Folder holding entity-scoped records: `PlayersData/<id>/<namespace>`.
pub const PLAYERS_DATA_FOLDER: &str = "PlayersData/";
/// Folder holding named records: `PluginsData/<namespace>/<name>`.
pub const PLUGINS_DATA_FOLDER: &str = "PluginsData/";
/// Prefix prepended to a storage path when a stale record is archived.
pub const BACKUP_DATA_FOLDER: &str = "Backup/";

fn check_segment(segment: &str) -> Result<(), &'static str> {
    match segment {
        "" => Err("empty namespace or name"),
        "." | ".." => Err("relative namespace or name"),
        _ if segment.contains('/') || segment.contains('\\') => {
            Err("path separator in namespace or name")
        }
        _ => Ok(()),
    }
}

/// Which kind of primary key a record is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Keyed by a 64-bit entity id, e.g. a player.
    Entity,
    /// Keyed by a free-form name, e.g. global plugin state.
    Named,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => f.write_str("entity"),
            Self::Named => f.write_str("named"),
        }
    }
}

/// The outer registry key: an entity id or a name.
///
/// Together with a namespace it identifies exactly one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimaryKey {
    /// An entity id.
    Entity(u64),
    /// A named, non-entity key.
    Named(String),
}

impl PrimaryKey {
    /// Returns the category of this key.
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Self::Entity(_) => Category::Entity,
            Self::Named(_) => Category::Named,
        }
    }

    /// Checks that this key and `namespace` each form a single storage path
    /// segment, so no two distinct keys can share a storage path.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] naming the offending part.
    pub fn validate(&self, namespace: &str) -> CoreResult<()> {
        let invalid = |reason| CoreError::invalid_key(self, namespace, reason);
        check_segment(namespace).map_err(invalid)?;
        if let Self::Named(name) = self {
            check_segment(name).map_err(invalid)?;
        }
        Ok(())
    }

    /// Returns the storage path of the record owned by `namespace`.
    #[must_use]
    pub fn storage_path(&self, namespace: &str) -> String {
        match self {
            Self::Entity(id) => format!("{PLAYERS_DATA_FOLDER}{id}/{namespace}"),
            Self::Named(name) => format!("{PLUGINS_DATA_FOLDER}{namespace}/{name}"),
        }
    }
}

impl From<u64> for PrimaryKey {
    fn from(id: u64) -> Self {
        Self::Entity(id)
    }
}

impl From<&str> for PrimaryKey {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<&PrimaryKey> for PrimaryKey {
    fn from(key: &PrimaryKey) -> Self {
        key.clone()
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(id) => write!(f, "entity {id}"),
            Self::Named(name) => write!(f, "name {name:?}"),
        }
    }
}
