//! Property-based test generators using proptest.
//!
//! Provides strategies for keys, namespaces and records that stay within
//! what the storage layer accepts as path segments, plus names that must be
//! rejected before they reach storage.

use crate::fixtures::{Settings, Wallet};
use extdata_core::{PrimaryKey, VersionNumber};
use proptest::prelude::*;

/// Strategy for generating entity ids.
pub fn entity_id_strategy() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Strategy for generating valid namespace names.
pub fn namespace_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating record names usable as a path segment.
pub fn record_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9_-]{0,23}").expect("Invalid regex")
}

/// Strategy for generating names that are not a single path segment.
pub fn invalid_segment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just(".".to_string()),
        Just("..".to_string()),
        ("[a-z]{0,6}", prop_oneof![Just('/'), Just('\\')], "[a-z]{0,6}")
            .prop_map(|(head, sep, tail)| format!("{head}{sep}{tail}")),
    ]
}

/// Strategy for generating primary keys of either category.
pub fn primary_key_strategy() -> impl Strategy<Value = PrimaryKey> {
    prop_oneof![
        entity_id_strategy().prop_map(PrimaryKey::Entity),
        record_name_strategy().prop_map(PrimaryKey::Named),
    ]
}

/// Strategy for generating versions.
pub fn version_strategy() -> impl Strategy<Value = VersionNumber> {
    (0u16..8, 0u16..8, 0u16..8)
        .prop_map(|(major, minor, patch)| VersionNumber::new(major, minor, patch))
}

/// Strategy for generating wallets.
pub fn wallet_strategy() -> impl Strategy<Value = Wallet> {
    any::<i64>().prop_map(Wallet::with_balance)
}

/// Strategy for generating settings.
pub fn settings_strategy() -> impl Strategy<Value = Settings> {
    ("[a-z ]{0,32}", 0u32..50).prop_map(|(title, max_homes)| Settings { title, max_homes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use extdata_storage::validate_path;

    proptest! {
        #[test]
        fn generated_keys_make_valid_paths(
            key in primary_key_strategy(),
            ns in namespace_strategy(),
        ) {
            prop_assert!(validate_path(&key.storage_path(&ns)).is_ok());
        }
    }
}
