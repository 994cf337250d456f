//! Fuzz target for the paired keystream pipeline
//!
//! Drives two peers through pairing, delivery, loss, restarts and unpairing,
//! and checks them against the reference model after every step.
//!
//! # Strategy
//!
//! - Arbitrary operation sequences from the harness model
//! - Both secret persistence modes
//! - Deterministic environment seeded from the input
//!
//! # Invariants
//!
//! - Real peers and model agree on pairing state and counters
//! - Operations fail or succeed identically in both
//! - Messages arrive intact exactly when counters were in step
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use entangle_core::{EngineConfig, SecretPersistence};
use entangle_harness::{ModelWorld, Operation, TwinPeers};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Scenario {
    rng_seed: u64,
    persist_secret: bool,
    operations: Vec<Operation>,
}

fuzz_target!(|scenario: Scenario| {
    let secret_persistence = if scenario.persist_secret {
        SecretPersistence::Secret
    } else {
        SecretPersistence::FingerprintOnly
    };
    let config = EngineConfig { secret_persistence, ..Default::default() };

    let mut model = ModelWorld::new();
    let mut twins = TwinPeers::new(scenario.rng_seed, config).expect("default config is valid");

    for (step, op) in scenario.operations.iter().take(64).enumerate() {
        let expected = model.apply(op);
        let actual = twins.apply(op);
        assert_eq!(expected, actual, "step {step}: result mismatch for {op:?}");

        let observed = twins.observable_state().expect("memory store never fails");
        assert_eq!(model.observable_state(), observed, "step {step}: state mismatch after {op:?}");
    }
});
