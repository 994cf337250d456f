//! Model-based property tests.
//!
//! These tests generate random operation sequences and verify that the real
//! twins behave identically to the reference model.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!      ModelWorld     TwinPeers       Compare
//!      (reference)    (real)          Results
//! ```

use entangle_core::{EngineConfig, SecretPersistence};
use entangle_harness::{ModelWorld, Operation, PeerId, SmallMessage, TwinPeers};
use proptest::prelude::*;

fn peer_strategy() -> impl Strategy<Value = PeerId> {
    prop_oneof![Just(PeerId::Alice), Just(PeerId::Bob)]
}

fn small_message_strategy() -> impl Strategy<Value = SmallMessage> {
    (any::<u8>(), any::<u8>()).prop_map(|(seed, size_class)| SmallMessage { seed, size_class })
}

/// Strategy for generating operations.
fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        // Weight towards traffic
        1 => Just(Operation::Pair),
        8 => (peer_strategy(), small_message_strategy())
            .prop_map(|(from, content)| Operation::Send { from, content }),
        2 => (peer_strategy(), small_message_strategy())
            .prop_map(|(from, content)| Operation::Lose { from, content }),
        2 => peer_strategy().prop_map(|peer| Operation::Restart { peer }),
        1 => peer_strategy().prop_map(|peer| Operation::Unpair { peer }),
    ]
}

fn check_against_model(
    seed: u64,
    persistence: SecretPersistence,
    ops: &[Operation],
) -> Result<(), TestCaseError> {
    let config = EngineConfig { secret_persistence: persistence, ..Default::default() };
    let mut model = ModelWorld::new();
    let mut real = TwinPeers::new(seed, config).unwrap();

    for (i, op) in ops.iter().enumerate() {
        let model_result = model.apply(op);
        let real_result = real.apply(op);

        prop_assert_eq!(
            &model_result,
            &real_result,
            "Divergence at operation {}: {:?}",
            i,
            op
        );
        prop_assert_eq!(
            model.observable_state(),
            real.observable_state().unwrap(),
            "State divergence after operation {}: {:?}",
            i,
            op
        );
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Verify that operation results match between model and real twins.
    #[test]
    fn prop_model_matches_real(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 0..40)
    ) {
        check_against_model(seed, SecretPersistence::FingerprintOnly, &ops)?;
    }

    /// Same check with the secret persisted at rest.
    #[test]
    fn prop_model_matches_real_with_persisted_secret(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 0..40)
    ) {
        check_against_model(seed, SecretPersistence::Secret, &ops)?;
    }
}
