//! Property tests over the manager.

use extdata_testkit::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

proptest! {
    #[test]
    fn registry_holds_one_record_per_key_and_namespace(
        entries in prop::collection::vec((primary_key_strategy(), prop::bool::ANY), 0..32)
    ) {
        let mut host = TestHost::new();
        let mut expected = BTreeSet::new();

        for (key, econ) in entries {
            let ns = if econ { ECON } else { HOMES };
            let fresh = expected.insert((key.to_string(), ns));
            let result = host.create(ns, key, Some(Wallet::default()));
            prop_assert_eq!(result.is_ok(), fresh);
        }

        prop_assert_eq!(host.registry().len(), expected.len());
        prop_assert_eq!(host.pending_writes(), expected.len());
    }

    #[test]
    fn unusable_names_never_reach_the_queue(
        name in invalid_segment_strategy(),
        wallet in wallet_strategy(),
    ) {
        let mut host = TestHost::new();

        let created = host.create(ECON, name.as_str(), Some(wallet));
        prop_assert!(matches!(created, Err(CoreError::InvalidKey { .. })), "accepted {:?}", name);
        let loaded = host.load_or_default::<Wallet>(name.as_str(), 1);
        prop_assert!(matches!(loaded, Err(CoreError::InvalidKey { .. })), "accepted {:?}", name);
        prop_assert!(host.registry().is_empty());
        prop_assert_eq!(host.pending_writes(), 0);
    }

    #[test]
    fn every_save_costs_exactly_one_tick(saves in 0usize..24, wallet in wallet_strategy()) {
        let mut host = TestHost::new();
        host.create(ECON, 1, Some(wallet.clone())).unwrap();
        host.drain_all();
        let before = host.backend().write_count();

        for _ in 0..saves {
            host.save(ECON, 1).unwrap();
        }
        let ticks = host.drain_all();

        prop_assert_eq!(ticks.len(), saves);
        prop_assert_eq!(host.backend().write_count() - before, saves);
        prop_assert_eq!(host.stored::<Wallet>("PlayersData/1/econ"), Some(wallet));
    }

    #[test]
    fn mismatched_versions_always_archive(
        stored in version_strategy(),
        settings in settings_strategy(),
    ) {
        let blob = stored_blob(stored, &settings);
        let seeded = [("PluginsData/homes/spawn", blob.clone())];
        let mut host = TestHost::seeded(Config::default(), seeded);

        let outcome = host.load_or_default::<Settings>(HOMES, "spawn").unwrap();
        if stored == HOMES_VERSION {
            prop_assert_eq!(outcome, LoadOutcome::Loaded { version: stored });
            prop_assert_eq!(host.get::<Settings>(HOMES, "spawn").unwrap(), &settings);
        } else {
            prop_assert!(matches!(outcome, LoadOutcome::Replaced { .. }), "unexpected outcome");
            prop_assert_eq!(host.backend().read("Backup/PluginsData/homes/spawn").unwrap(), blob);
        }
    }
}
