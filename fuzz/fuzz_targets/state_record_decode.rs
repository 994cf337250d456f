//! Fuzz target for persisted state records
//!
//! A state file can be truncated or tampered with between runs.
//!
//! # Strategy
//!
//! - Random bytes: completely arbitrary record payloads
//! - Mutated records: a valid record with bytes flipped or truncated
//!
//! # Invariants
//!
//! - NEVER panic on malformed records
//! - A decoded record never carries a counter beyond the counter space
//! - A decoded record that carries a secret matches its own fingerprint

#![no_main]

use arbitrary::Arbitrary;
use entangle_core::{COUNTER_SPACE, SecretBinding, SecretPersistence, StateRecord};
use entangle_crypto::derive_secret;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum RecordInput {
    RandomBytes(Vec<u8>),
    Mutated { seed: [u8; 32], salt: [u8; 16], counter: u32, flips: Vec<(u16, u8)>, cut: u16 },
}

fuzz_target!(|input: RecordInput| {
    let bytes = match input {
        RecordInput::RandomBytes(bytes) => bytes,
        RecordInput::Mutated { seed, salt, counter, flips, cut } => {
            let Ok(secret) = derive_secret(&seed, seed.len()) else {
                return;
            };
            let binding = SecretBinding::new(&secret, salt, SecretPersistence::Secret);
            let mut record = StateRecord::fresh(binding);
            record.counter = u64::from(counter);

            let mut bytes = record.encode().expect("valid record must encode");
            for (index, mask) in flips {
                if let Some(byte) = bytes.get_mut(usize::from(index) % bytes.len().max(1)) {
                    *byte ^= mask;
                }
            }
            bytes.truncate(bytes.len().saturating_sub(usize::from(cut % 8)));
            bytes
        },
    };

    let Ok(record) = StateRecord::decode(&bytes) else {
        return;
    };

    assert!(record.counter <= COUNTER_SPACE);
    if let Some(secret) = record.binding.stored_secret() {
        assert!(record.binding.matches(secret));
    }
});
