//! Manager configuration.

use crate::version::VersionNumber;
use crate::EXTENSION_VERSION;
use serde::{Deserialize, Serialize};

/// Configuration supplied by the host at startup.
///
/// Field names serialize to the keys of the extension's JSON config file so
/// a host can deserialize it with any `serde` format. Only
/// `check_versions` and `debug` change core behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Whether the host should auto-update the extension.
    #[serde(rename = "Automatically update this extension")]
    pub auto_update: bool,

    /// Whether stored records written under another namespace version are
    /// archived and replaced.
    #[serde(rename = "Compare version of plugins with its data file and replace if there is a discrepancy")]
    pub check_versions: bool,

    /// Extension version the config was written by.
    #[serde(rename = "Version", default)]
    pub version: Option<VersionNumber>,

    /// Whether operation outcomes are logged.
    #[serde(skip)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_update: true,
            check_versions: true,
            version: Some(EXTENSION_VERSION),
            debug: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the host should auto-update.
    #[must_use]
    pub const fn auto_update(mut self, value: bool) -> Self {
        self.auto_update = value;
        self
    }

    /// Sets whether record versions are checked on load.
    #[must_use]
    pub const fn check_versions(mut self, value: bool) -> Self {
        self.check_versions = value;
        self
    }

    /// Sets whether operation outcomes are logged.
    #[must_use]
    pub const fn debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Replaces a config written by another extension version with defaults.
    ///
    /// Returns the config to use and whether it was reset. The debug toggle
    /// survives a reset.
    #[must_use]
    pub fn checked(self, current: VersionNumber) -> (Self, bool) {
        if self.version == Some(current) {
            return (self, false);
        }
        let reset = Self {
            version: Some(current),
            debug: self.debug,
            ..Self::default()
        };
        (reset, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.auto_update);
        assert!(config.check_versions);
        assert!(!config.debug);
        assert_eq!(config.version, Some(EXTENSION_VERSION));
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new().check_versions(false).auto_update(false).debug(true);

        assert!(!config.check_versions);
        assert!(!config.auto_update);
        assert!(config.debug);
    }

    #[test]
    fn current_config_is_kept() {
        let config = Config::new().check_versions(false);
        let (checked, reset) = config.clone().checked(EXTENSION_VERSION);
        assert!(!reset);
        assert_eq!(checked, config);
    }

    #[test]
    fn outdated_config_is_reset() {
        let mut config = Config::new().check_versions(false).debug(true);
        config.version = Some(VersionNumber::new(1, 0, 4));

        let (checked, reset) = config.checked(EXTENSION_VERSION);
        assert!(reset);
        assert!(checked.check_versions);
        assert!(checked.debug);
        assert_eq!(checked.version, Some(EXTENSION_VERSION));
    }

    #[test]
    fn json_uses_extension_keys() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["Automatically update this extension"], true);
        assert_eq!(json["Version"]["minor"], 0);
        assert!(json.get("debug").is_none());

        let parsed: Config = serde_json::from_str(
            r#"{"Automatically update this extension": false,
                "Compare version of plugins with its data file and replace if there is a discrepancy": false}"#,
        )
        .unwrap();
        assert!(!parsed.auto_update);
        assert!(!parsed.check_versions);
        assert_eq!(parsed.version, None);
    }
}
