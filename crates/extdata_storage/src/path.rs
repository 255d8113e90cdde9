//! Virtual path validation shared by all backends.

use crate::error::{StorageError, StorageResult};

/// Checks that `path` is a relative, `/`-separated virtual path.
///
/// Empty paths, empty segments, `.`/`..` segments and backslashes are
/// rejected so a path can never escape a backend's root.
///
/// # Errors
///
/// Returns [`StorageError::InvalidPath`] describing the first violation.
pub fn validate_path(path: &str) -> StorageResult<()> {
    let invalid = |reason| {
        Err(StorageError::InvalidPath {
            path: path.to_string(),
            reason,
        })
    };

    if path.is_empty() {
        return invalid("path is empty");
    }
    if path.contains('\\') {
        return invalid("backslash in path");
    }
    for segment in path.split('/') {
        match segment {
            "" => return invalid("empty path segment"),
            "." | ".." => return invalid("relative path segment"),
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_nested_paths() {
        assert!(validate_path("PlayersData/1001/econ").is_ok());
        assert!(validate_path("Backup/PluginsData/econ/bank").is_ok());
    }

    #[test]
    fn rejects_empty_and_relative() {
        assert!(validate_path("").is_err());
        assert!(validate_path("/abs").is_err());
        assert!(validate_path("a//b").is_err());
        assert!(validate_path("a/../b").is_err());
        assert!(validate_path("./a").is_err());
        assert!(validate_path("a\\b").is_err());
    }

    proptest! {
        #[test]
        fn valid_paths_never_climb(
            segments in prop::collection::vec("[A-Za-z0-9_.-]{1,12}", 1..6)
        ) {
            let path = segments.join("/");
            let climbs = segments.iter().any(|s| s == "." || s == "..");
            prop_assert_eq!(validate_path(&path).is_ok(), !climbs);
        }
    }
}
