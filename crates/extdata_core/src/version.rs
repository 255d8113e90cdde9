//! Three-part schema versions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A `major.minor.patch` version.
///
/// Namespaces declare one, records carry the one they were written with.
/// Any inequality between the two counts as a mismatch; ordering is only
/// provided for display and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionNumber {
    /// Major component.
    pub major: u16,
    /// Minor component.
    pub minor: u16,
    /// Patch component.
    pub patch: u16,
}

impl VersionNumber {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error returned when a version string is not `major.minor.patch`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version {input:?}: expected major.minor.patch")]
pub struct ParseVersionError {
    input: String,
}

impl FromStr for VersionNumber {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVersionError {
            input: s.to_string(),
        };
        let trimmed = s.trim().trim_start_matches('v');
        let mut parts = trimmed.split('.');
        let mut next = || -> Result<u16, ParseVersionError> {
            parts
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or_else(err)
        };
        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_and_parse() {
        let v = VersionNumber::new(1, 0, 6);
        assert_eq!(v.to_string(), "1.0.6");
        assert_eq!("1.0.6".parse::<VersionNumber>().unwrap(), v);
        assert_eq!("v2.1.0".parse::<VersionNumber>().unwrap(), VersionNumber::new(2, 1, 0));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("1.0".parse::<VersionNumber>().is_err());
        assert!("1.0.0.0".parse::<VersionNumber>().is_err());
        assert!("a.b.c".parse::<VersionNumber>().is_err());
        assert!("".parse::<VersionNumber>().is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(VersionNumber::new(1, 2, 0) > VersionNumber::new(1, 1, 9));
        assert!(VersionNumber::new(2, 0, 0) > VersionNumber::new(1, 9, 9));
    }

    proptest! {
        #[test]
        fn display_parses_back(major: u16, minor: u16, patch: u16) {
            let v = VersionNumber::new(major, minor, patch);
            prop_assert_eq!(v.to_string().parse::<VersionNumber>().unwrap(), v);
        }
    }
}
