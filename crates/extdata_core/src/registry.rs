//! In-memory registry of loaded records.
//!
//! The registry is a two-level map: the outer key is the [`PrimaryKey`]
//! (an entity id or a name), the inner key is the owning namespace. Records
//! of different namespaces have different Rust types, so each one is stored
//! type-erased and downcast on access.
//!
//! ## Invariants
//!
//! - At most one record per `(primary key, namespace)`
//! - [`Registry::set`] never overwrites an occupied slot
//! - An outer entry is removed as soon as its last namespace is removed
//! - Iteration is ordered by key, then namespace

use crate::codec::{self, Record};
use crate::error::{CoreError, CoreResult};
use crate::key::{Category, PrimaryKey};
use crate::version::VersionNumber;
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;

trait AnyRecord: Send {
    fn encode(&self, version: VersionNumber) -> CoreResult<Vec<u8>>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Record> AnyRecord for T {
    fn encode(&self, version: VersionNumber) -> CoreResult<Vec<u8>> {
        codec::encode_record(version, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// A loaded record together with the version it was loaded or created with.
pub struct Entry {
    version: VersionNumber,
    record: Box<dyn AnyRecord>,
}

impl Entry {
    fn new<T: Record>(version: VersionNumber, record: T) -> Self {
        Self {
            version,
            record: Box::new(record),
        }
    }

    /// Returns the version this record is stored with.
    #[must_use]
    pub fn version(&self) -> VersionNumber {
        self.version
    }

    /// Returns the Rust type name of the record.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.record.type_name()
    }

    /// Returns the record if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.record.as_any().downcast_ref()
    }

    /// Encodes a snapshot of the record for persistence.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Codec`] if the record cannot be serialized.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        self.record.encode(self.version)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("version", &self.version)
            .field("type", &self.type_name())
            .finish()
    }
}

type Slots = BTreeMap<String, Entry>;

/// Loaded records keyed by primary key and namespace.
#[derive(Debug, Default)]
pub struct Registry {
    entities: BTreeMap<u64, Slots>,
    named: BTreeMap<String, Slots>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self, key: &PrimaryKey) -> Option<&Slots> {
        match key {
            PrimaryKey::Entity(id) => self.entities.get(id),
            PrimaryKey::Named(name) => self.named.get(name),
        }
    }

    fn slots_mut(&mut self, key: &PrimaryKey) -> Option<&mut Slots> {
        match key {
            PrimaryKey::Entity(id) => self.entities.get_mut(id),
            PrimaryKey::Named(name) => self.named.get_mut(name),
        }
    }

    /// Returns `true` if any namespace has a record under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &PrimaryKey) -> bool {
        self.slots(key).is_some()
    }

    /// Returns `true` if `namespace` has a record under `key`.
    #[must_use]
    pub fn contains(&self, key: &PrimaryKey, namespace: &str) -> bool {
        self.slots(key).is_some_and(|s| s.contains_key(namespace))
    }

    /// Returns the type-erased entry for `(key, namespace)`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotLoaded`] if the slot is empty.
    pub fn entry(&self, key: &PrimaryKey, namespace: &str) -> CoreResult<&Entry> {
        self.slots(key)
            .and_then(|s| s.get(namespace))
            .ok_or_else(|| CoreError::not_loaded(key, namespace))
    }

    /// Returns the record for `(key, namespace)`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotLoaded`] if the slot is empty
    /// - [`CoreError::TypeMismatch`] if the record is not a `T`
    pub fn get<T: Record>(&self, key: &PrimaryKey, namespace: &str) -> CoreResult<&T> {
        let entry = self.entry(key, namespace)?;
        entry.downcast_ref().ok_or_else(|| {
            CoreError::type_mismatch(key, namespace, type_name::<T>(), entry.type_name())
        })
    }

    /// Returns the record for `(key, namespace)` for in-place mutation.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::get`].
    pub fn get_mut<T: Record>(&mut self, key: &PrimaryKey, namespace: &str) -> CoreResult<&mut T> {
        let entry = self
            .slots_mut(key)
            .and_then(|s| s.get_mut(namespace))
            .ok_or_else(|| CoreError::not_loaded(key, namespace))?;
        let stored = entry.type_name();
        entry
            .record
            .as_any_mut()
            .downcast_mut()
            .ok_or_else(|| CoreError::type_mismatch(key, namespace, type_name::<T>(), stored))
    }

    /// Inserts a record if the slot is free.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyLoaded`] if `namespace` already has a
    /// record under `key`; the existing record is left untouched.
    pub fn set<T: Record>(
        &mut self,
        key: PrimaryKey,
        namespace: &str,
        version: VersionNumber,
        record: T,
    ) -> CoreResult<()> {
        if self.contains(&key, namespace) {
            return Err(CoreError::already_loaded(&key, namespace));
        }
        let slots = match key {
            PrimaryKey::Entity(id) => self.entities.entry(id).or_default(),
            PrimaryKey::Named(name) => self.named.entry(name).or_default(),
        };
        slots.insert(namespace.to_string(), Entry::new(version, record));
        Ok(())
    }

    /// Removes the record for `(key, namespace)`, pruning `key` if it was
    /// the last namespace.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotLoaded`] if the slot is empty.
    pub fn remove(&mut self, key: &PrimaryKey, namespace: &str) -> CoreResult<Entry> {
        let slots = self
            .slots_mut(key)
            .ok_or_else(|| CoreError::not_loaded(key, namespace))?;
        let entry = slots
            .remove(namespace)
            .ok_or_else(|| CoreError::not_loaded(key, namespace))?;
        if slots.is_empty() {
            match key {
                PrimaryKey::Entity(id) => self.entities.remove(id),
                PrimaryKey::Named(name) => self.named.remove(name),
            };
        }
        Ok(entry)
    }

    /// Removes every namespace's record under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotLoaded`] if nothing is loaded under `key`.
    pub fn remove_all(&mut self, key: &PrimaryKey) -> CoreResult<Vec<(String, Entry)>> {
        let slots = match key {
            PrimaryKey::Entity(id) => self.entities.remove(id),
            PrimaryKey::Named(name) => self.named.remove(name),
        };
        slots
            .map(|s| s.into_iter().collect())
            .ok_or_else(|| CoreError::key_not_loaded(key))
    }

    /// Returns the namespaces holding a record under `key`, sorted.
    #[must_use]
    pub fn namespaces(&self, key: &PrimaryKey) -> Vec<String> {
        self.slots(key)
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns every loaded primary key of `category`, sorted.
    #[must_use]
    pub fn keys(&self, category: Category) -> Vec<PrimaryKey> {
        match category {
            Category::Entity => self.entities.keys().map(|&id| PrimaryKey::Entity(id)).collect(),
            Category::Named => self.named.keys().cloned().map(PrimaryKey::Named).collect(),
        }
    }

    /// Returns every primary key, in both categories, that holds a record
    /// owned by `namespace`.
    #[must_use]
    pub fn keys_with_namespace(&self, namespace: &str) -> Vec<PrimaryKey> {
        let entities = self
            .entities
            .iter()
            .filter(|(_, s)| s.contains_key(namespace))
            .map(|(&id, _)| PrimaryKey::Entity(id));
        let named = self
            .named
            .iter()
            .filter(|(_, s)| s.contains_key(namespace))
            .map(|(name, _)| PrimaryKey::Named(name.clone()));
        entities.chain(named).collect()
    }

    /// Returns the number of records in `category`.
    #[must_use]
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Entity => self.entities.values().map(BTreeMap::len).sum(),
            Category::Named => self.named.values().map(BTreeMap::len).sum(),
        }
    }

    /// Returns the total number of loaded records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count(Category::Entity) + self.count(Category::Named)
    }

    /// Returns `true` if no record is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.named.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Wallet {
        balance: i64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Homes {
        names: Vec<String>,
    }

    const V1: VersionNumber = VersionNumber::new(1, 0, 0);

    fn key(id: u64) -> PrimaryKey {
        PrimaryKey::Entity(id)
    }

    #[test]
    fn get_on_empty_registry_is_not_loaded() {
        let registry = Registry::new();
        let result = registry.get::<Wallet>(&key(1), "econ");
        assert!(matches!(result, Err(CoreError::NotLoaded { .. })));
        assert!(!registry.contains(&key(1), "econ"));
    }

    #[test]
    fn set_then_get() {
        let mut registry = Registry::new();
        registry.set(key(1), "econ", V1, Wallet { balance: 5 }).unwrap();

        assert_eq!(registry.get::<Wallet>(&key(1), "econ").unwrap().balance, 5);
        assert_eq!(registry.entry(&key(1), "econ").unwrap().version(), V1);
        assert!(registry.contains_key(&key(1)));
    }

    #[test]
    fn set_refuses_occupied_slot() {
        let mut registry = Registry::new();
        registry.set(key(1), "econ", V1, Wallet { balance: 5 }).unwrap();

        let result = registry.set(key(1), "econ", V1, Wallet { balance: 99 });
        assert!(matches!(result, Err(CoreError::AlreadyLoaded { .. })));
        assert_eq!(registry.get::<Wallet>(&key(1), "econ").unwrap().balance, 5);
    }

    #[test]
    fn namespaces_share_a_primary_key() {
        let mut registry = Registry::new();
        registry.set(key(1), "econ", V1, Wallet { balance: 5 }).unwrap();
        registry
            .set(key(1), "homes", V1, Homes { names: vec!["base".into()] })
            .unwrap();

        assert_eq!(registry.namespaces(&key(1)), vec!["econ", "homes"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.keys(Category::Entity), vec![key(1)]);
    }

    #[test]
    fn wrong_type_is_a_mismatch_not_a_panic() {
        let mut registry = Registry::new();
        registry.set(key(1), "econ", V1, Wallet { balance: 5 }).unwrap();

        let result = registry.get::<Homes>(&key(1), "econ");
        assert!(matches!(result, Err(CoreError::TypeMismatch { .. })));
        let result = registry.get_mut::<Homes>(&key(1), "econ");
        assert!(matches!(result, Err(CoreError::TypeMismatch { .. })));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut registry = Registry::new();
        registry.set(key(1), "econ", V1, Wallet { balance: 5 }).unwrap();

        registry.get_mut::<Wallet>(&key(1), "econ").unwrap().balance += 10;
        assert_eq!(registry.get::<Wallet>(&key(1), "econ").unwrap().balance, 15);
    }

    #[test]
    fn remove_prunes_empty_primary_key() {
        let mut registry = Registry::new();
        registry.set(key(1), "econ", V1, Wallet { balance: 5 }).unwrap();
        registry
            .set(key(1), "homes", V1, Homes { names: vec![] })
            .unwrap();

        registry.remove(&key(1), "econ").unwrap();
        assert!(registry.contains_key(&key(1)));

        registry.remove(&key(1), "homes").unwrap();
        assert!(!registry.contains_key(&key(1)));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_missing_is_not_loaded() {
        let mut registry = Registry::new();
        registry.set(key(1), "econ", V1, Wallet { balance: 5 }).unwrap();

        let result = registry.remove(&key(1), "homes");
        assert!(matches!(result, Err(CoreError::NotLoaded { .. })));
        assert!(registry.contains(&key(1), "econ"));
    }

    #[test]
    fn remove_all_evicts_every_namespace() {
        let mut registry = Registry::new();
        registry.set(key(1), "econ", V1, Wallet { balance: 5 }).unwrap();
        registry
            .set(key(1), "homes", V1, Homes { names: vec![] })
            .unwrap();

        let removed = registry.remove_all(&key(1)).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(registry.is_empty());
        assert!(registry.remove_all(&key(1)).is_err());
    }

    #[test]
    fn keys_with_namespace_spans_categories() {
        let mut registry = Registry::new();
        registry.set(key(2), "econ", V1, Wallet { balance: 1 }).unwrap();
        registry.set(key(1), "homes", V1, Homes { names: vec![] }).unwrap();
        registry
            .set(PrimaryKey::from("bank"), "econ", V1, Wallet { balance: 0 })
            .unwrap();

        assert_eq!(
            registry.keys_with_namespace("econ"),
            vec![key(2), PrimaryKey::from("bank")]
        );
        assert_eq!(registry.count(Category::Entity), 2);
        assert_eq!(registry.count(Category::Named), 1);
    }

    #[test]
    fn entry_encodes_snapshot() {
        let mut registry = Registry::new();
        registry.set(key(1), "econ", V1, Wallet { balance: 7 }).unwrap();

        let bytes = registry.entry(&key(1), "econ").unwrap().encode().unwrap();
        let (version, wallet): (_, Wallet) = codec::decode_record(&bytes).unwrap();
        assert_eq!(version, V1);
        assert_eq!(wallet, Wallet { balance: 7 });
    }
}
