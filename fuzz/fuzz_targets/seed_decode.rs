//! Fuzz target for seed intake
//!
//! A seed arrives from a scanned QR code, so its payload is untrusted.
//!
//! # Strategy
//!
//! - Raw text: arbitrary strings fed to Base64 decoding
//! - Raw bytes: arbitrary byte slices of any length
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Accepted seeds are exactly 32 bytes and not all zero
//! - Accepted seeds re-encode to a payload that decodes to the same seed
//! - Accepted seeds always derive a secret

#![no_main]

use arbitrary::Arbitrary;
use entangle_core::{SEED_LEN, Seed};
use entangle_crypto::derive_secret;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum SeedInput {
    Text(String),
    Bytes(Vec<u8>),
}

fuzz_target!(|input: SeedInput| {
    let seed = match input {
        SeedInput::Text(text) => Seed::from_base64(&text),
        SeedInput::Bytes(bytes) => Seed::from_bytes(&bytes),
    };
    let Ok(seed) = seed else {
        return;
    };

    assert_eq!(seed.as_bytes().len(), SEED_LEN);
    assert!(seed.as_bytes().iter().any(|&b| b != 0));

    let reparsed = Seed::from_base64(&seed.to_base64()).expect("re-encoded seed must decode");
    assert_eq!(reparsed, seed);

    derive_secret(seed.as_bytes(), SEED_LEN).expect("accepted seed must derive a secret");
});
