//! Namespace activity and declared versions.

use crate::version::VersionNumber;
use std::collections::BTreeMap;

/// Answers which namespaces are active and which version each declares.
///
/// Hosts implement this over their plugin manager; [`Namespaces`] is a
/// map-backed implementation for hosts that track plugins themselves.
pub trait NamespaceRegistry {
    /// Returns `true` if `namespace` is registered and currently loaded.
    fn is_active(&self, namespace: &str) -> bool;

    /// Returns the version `namespace` declares, if it is registered.
    fn declared_version(&self, namespace: &str) -> Option<VersionNumber>;

    /// Returns the declared version only if the namespace is active.
    fn active_version(&self, namespace: &str) -> Option<VersionNumber> {
        if self.is_active(namespace) {
            self.declared_version(namespace)
        } else {
            None
        }
    }
}

/// Registration state of one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceInfo {
    /// The declared version.
    pub version: VersionNumber,
    /// Whether the namespace is currently loaded.
    pub active: bool,
}

/// A map-backed [`NamespaceRegistry`].
#[derive(Debug, Clone, Default)]
pub struct Namespaces {
    entries: BTreeMap<String, NamespaceInfo>,
}

impl Namespaces {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `namespace` as active with `version`.
    ///
    /// Re-registering replaces the version, as a reloaded plugin would.
    pub fn register(&mut self, namespace: impl Into<String>, version: VersionNumber) {
        self.entries.insert(
            namespace.into(),
            NamespaceInfo {
                version,
                active: true,
            },
        );
    }

    /// Marks a registered namespace active. Returns `false` if unknown.
    pub fn activate(&mut self, namespace: &str) -> bool {
        self.set_active(namespace, true)
    }

    /// Marks a registered namespace inactive. Returns `false` if unknown.
    pub fn deactivate(&mut self, namespace: &str) -> bool {
        self.set_active(namespace, false)
    }

    fn set_active(&mut self, namespace: &str, active: bool) -> bool {
        match self.entries.get_mut(namespace) {
            Some(info) => {
                info.active = active;
                true
            }
            None => false,
        }
    }

    /// Returns the registration of `namespace`.
    #[must_use]
    pub fn get(&self, namespace: &str) -> Option<NamespaceInfo> {
        self.entries.get(namespace).copied()
    }

    /// Returns the number of registered namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NamespaceRegistry for Namespaces {
    fn is_active(&self, namespace: &str) -> bool {
        self.entries.get(namespace).is_some_and(|i| i.active)
    }

    fn declared_version(&self, namespace: &str) -> Option<VersionNumber> {
        self.entries.get(namespace).map(|i| i.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1: VersionNumber = VersionNumber::new(1, 0, 0);

    #[test]
    fn registered_namespace_is_active() {
        let mut namespaces = Namespaces::new();
        namespaces.register("econ", V1);

        assert!(namespaces.is_active("econ"));
        assert_eq!(namespaces.active_version("econ"), Some(V1));
        assert!(!namespaces.is_active("homes"));
        assert_eq!(namespaces.active_version("homes"), None);
    }

    #[test]
    fn deactivated_namespace_keeps_version() {
        let mut namespaces = Namespaces::new();
        namespaces.register("econ", V1);

        assert!(namespaces.deactivate("econ"));
        assert!(!namespaces.is_active("econ"));
        assert_eq!(namespaces.declared_version("econ"), Some(V1));
        assert_eq!(namespaces.active_version("econ"), None);

        assert!(namespaces.activate("econ"));
        assert!(namespaces.is_active("econ"));
        assert!(!namespaces.activate("unknown"));
    }

    #[test]
    fn reregister_replaces_version() {
        let mut namespaces = Namespaces::new();
        namespaces.register("econ", V1);
        namespaces.register("econ", VersionNumber::new(2, 0, 0));

        assert_eq!(namespaces.len(), 1);
        assert_eq!(namespaces.get("econ").unwrap().version, VersionNumber::new(2, 0, 0));
    }
}
