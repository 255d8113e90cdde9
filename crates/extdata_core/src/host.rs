//! Glue for hosts that drive the extension from frame callbacks.

use crate::config::Config;
use crate::error::CoreResult;
use crate::flush::DrainOutcome;
use crate::manager::DataManager;
use crate::namespace::NamespaceRegistry;
use crate::EXTENSION_VERSION;
use extdata_storage::StorageBackend;
use tracing::{info, warn};

/// Wraps a [`DataManager`] with host lifecycle hooks.
#[derive(Debug)]
pub struct DataExtension<B, N> {
    manager: DataManager<B, N>,
}

impl<B: StorageBackend, N: NamespaceRegistry> DataExtension<B, N> {
    /// Creates the extension.
    ///
    /// A config written by another extension version is replaced by defaults.
    pub fn new(config: Config, backend: B, namespaces: N) -> Self {
        let (config, reset) = config.checked(EXTENSION_VERSION);
        if reset {
            warn!(version = %EXTENSION_VERSION, "config is outdated, using defaults");
        }
        info!(
            version = %EXTENSION_VERSION,
            check_versions = config.check_versions,
            "data extension loaded"
        );
        Self {
            manager: DataManager::new(config, backend, namespaces),
        }
    }

    /// Returns the wrapped manager.
    pub fn manager(&self) -> &DataManager<B, N> {
        &self.manager
    }

    /// Returns the wrapped manager mutably.
    pub fn manager_mut(&mut self) -> &mut DataManager<B, N> {
        &mut self.manager
    }

    /// Unwraps the manager.
    pub fn into_manager(self) -> DataManager<B, N> {
        self.manager
    }

    /// Returns whether the host should keep calling [`Self::on_frame`].
    pub fn wants_frame(&self) -> bool {
        !self.manager.is_halted() && self.manager.is_flush_armed()
    }

    /// Per-frame hook.
    pub fn on_frame(&mut self) -> DrainOutcome {
        self.manager.drain_one()
    }

    /// Host save hook: starts a bulk save of everything.
    ///
    /// # Errors
    ///
    /// Same as [`DataManager::save_everything`].
    pub fn on_server_save(&mut self) -> CoreResult<usize> {
        self.manager.save_everything()
    }

    /// Extension unload hook. Halts the manager.
    pub fn unload(&mut self) {
        self.manager.halt();
    }

    /// Host shutdown hook. Halts the manager.
    pub fn on_shutdown(&mut self) {
        self.manager.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::namespace::Namespaces;
    use crate::version::VersionNumber;
    use extdata_storage::InMemoryBackend;

    fn extension(config: Config) -> DataExtension<InMemoryBackend, Namespaces> {
        let mut namespaces = Namespaces::new();
        namespaces.register("econ", VersionNumber::new(1, 0, 0));
        DataExtension::new(config, InMemoryBackend::new(), namespaces)
    }

    #[test]
    fn outdated_config_is_reset() {
        let mut config = Config::default().check_versions(false).debug(true);
        config.version = Some(VersionNumber::new(1, 0, 0));

        let ext = extension(config);
        assert!(ext.manager().config().check_versions);
        assert!(ext.manager().config().debug);
        assert_eq!(ext.manager().config().version, Some(EXTENSION_VERSION));
    }

    #[test]
    fn current_config_is_kept() {
        let ext = extension(Config::default().check_versions(false));
        assert!(!ext.manager().config().check_versions);
    }

    #[test]
    fn frames_drain_until_idle() {
        let mut ext = extension(Config::default());
        assert!(!ext.wants_frame());

        ext.manager_mut().load_or_default::<i64>("econ", 7).unwrap();
        assert!(ext.wants_frame());
        ext.on_frame();
        assert!(!ext.wants_frame());
        assert!(ext.manager().backend().exists("PlayersData/7/econ"));
    }

    #[test]
    fn shutdown_halts() {
        let mut ext = extension(Config::default());
        ext.manager_mut().load_or_default::<i64>("econ", 7).unwrap();
        ext.on_shutdown();

        assert!(!ext.wants_frame());
        assert!(matches!(ext.on_server_save(), Err(CoreError::Halted)));
    }
}
