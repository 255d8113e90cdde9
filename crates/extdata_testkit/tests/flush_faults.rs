//! Write failures during the drain.

use extdata_testkit::prelude::*;

#[test]
fn failed_write_is_dropped_and_drain_moves_on() {
    let mut host = TestHost::with_backend(Config::default(), FaultyBackend::new());
    host.create(ECON, 1, Some(Wallet::with_balance(1))).unwrap();
    host.create(ECON, 2, Some(Wallet::with_balance(2))).unwrap();
    host.backend_mut().fail_next_writes(1);

    let first = host.drain_one();
    assert_eq!(first.dropped.as_deref(), Some("PlayersData/1/econ"));
    let second = host.drain_one();
    assert_eq!(second.written.as_deref(), Some("PlayersData/2/econ"));
    assert!(second.disarmed);

    assert_eq!(host.scheduler().dropped_count(), 1);
    assert!(!host.backend().exists("PlayersData/1/econ"));
    assert_eq!(host.get::<Wallet>(ECON, 1).unwrap().balance, 1);
}

#[test]
fn dropped_write_is_recovered_by_the_next_save() {
    let mut host = TestHost::with_backend(Config::default(), FaultyBackend::new());
    host.create(ECON, 1, Some(Wallet::with_balance(4))).unwrap();
    host.backend_mut().fail_next_writes(1);
    host.drain_all();
    assert!(!host.backend().exists("PlayersData/1/econ"));

    host.save(ECON, 1).unwrap();
    host.drain_all();
    assert_eq!(host.stored::<Wallet>("PlayersData/1/econ"), Some(Wallet::with_balance(4)));
}

#[test]
fn batch_completes_even_when_writes_fail() {
    let backend = FaultyBackend::new().fail_prefix("PluginsData/");
    let mut host = TestHost::with_backend(Config::default(), backend);
    host.create(HOMES, "spawn", Some(Settings::default())).unwrap();
    host.create(HOMES, "arena", Some(Settings::default())).unwrap();
    host.drain_all();

    assert_eq!(host.save_all_named().unwrap(), 2);
    let outcomes = host.drain_all();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.dropped.is_some()));
    assert!(!host.batch_flags().named);
    assert_eq!(host.backend().failed_writes().len(), 4);
}
