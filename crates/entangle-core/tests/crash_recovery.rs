//! Crash recovery tests for `RedbStore`.
//!
//! These tests verify that the counter and its binding persist across
//! database close/reopen cycles, simulating app restarts.

use entangle_core::{
    EngineConfig, EngineError, RedbStore, Restored, SecretPersistence, Seed, Session, SystemEnv,
};
use tempfile::tempdir;

fn config(persistence: SecretPersistence) -> EngineConfig {
    EngineConfig { secret_persistence: persistence, ..Default::default() }
}

fn seed() -> Seed {
    Seed::from_bytes(&[0x5A; 32]).unwrap()
}

#[test]
fn test_counter_continues_after_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("state.redb");
    let calls = 10;

    // Pair and generate, then simulate shutdown
    {
        let store = RedbStore::open(&db_path).unwrap();
        let mut session = Session::new(store, SystemEnv::new(), config(SecretPersistence::Secret))
            .unwrap();
        session.establish(&seed()).unwrap();

        for _ in 0..calls {
            session.next_bytes(32).unwrap();
        }
        assert_eq!(session.counter().unwrap(), calls);

        // Database dropped
    }

    // Reopen: the next block must come from counter `calls`
    {
        let store = RedbStore::open(&db_path).unwrap();
        let mut session = Session::new(store, SystemEnv::new(), config(SecretPersistence::Secret))
            .unwrap();

        assert_eq!(session.restore().unwrap(), Restored::Resumed { counter: calls });
        let pad = session.next_bytes(1).unwrap();
        assert_eq!(u64::from(pad.first_counter()), calls);
        assert_eq!(session.counter().unwrap(), calls + 1);
    }
}

#[test]
fn test_fingerprint_only_restart_requires_seed() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("state.redb");

    {
        let store = RedbStore::open(&db_path).unwrap();
        let mut session =
            Session::new(store, SystemEnv::new(), config(SecretPersistence::FingerprintOnly))
                .unwrap();
        session.establish(&seed()).unwrap();
        session.next_bytes(100).unwrap();
    }

    {
        let store = RedbStore::open(&db_path).unwrap();
        let mut session =
            Session::new(store, SystemEnv::new(), config(SecretPersistence::FingerprintOnly))
                .unwrap();

        assert_eq!(session.restore().unwrap(), Restored::AwaitingSeed { counter: 4 });
        assert_eq!(session.next_bytes(1).unwrap_err(), EngineError::NotEntangled);

        assert_eq!(session.resume(&seed()).unwrap(), 4);
        assert_eq!(session.next_bytes(1).unwrap().first_counter(), 4);
    }
}

#[test]
fn test_restarted_peer_stays_in_sync() {
    let dir = tempdir().unwrap();
    let alice_path = dir.path().join("alice.redb");
    let bob_path = dir.path().join("bob.redb");

    let open = |path: &std::path::Path| {
        let store = RedbStore::open(path).unwrap();
        Session::new(store, SystemEnv::new(), config(SecretPersistence::Secret)).unwrap()
    };

    let mut alice = open(&alice_path);
    let mut bob = open(&bob_path);
    alice.establish(&seed()).unwrap();
    bob.establish(&seed()).unwrap();

    let first = alice.encrypt("before restart").unwrap();
    assert_eq!(bob.decrypt(&first).unwrap(), "before restart");

    drop(bob);
    let mut bob = open(&bob_path);
    bob.restore().unwrap();

    let second = alice.encrypt("after restart").unwrap();
    assert_eq!(bob.decrypt(&second).unwrap(), "after restart");
}

#[test]
fn test_unpair_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("state.redb");

    {
        let store = RedbStore::open(&db_path).unwrap();
        let mut session = Session::new(store, SystemEnv::new(), config(SecretPersistence::Secret))
            .unwrap();
        session.establish(&seed()).unwrap();
        session.disentangle().unwrap();
    }

    let store = RedbStore::open(&db_path).unwrap();
    let mut session =
        Session::new(store, SystemEnv::new(), config(SecretPersistence::Secret)).unwrap();
    assert_eq!(session.restore().unwrap(), Restored::Fresh);
}
