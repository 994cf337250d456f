//! Entangle Keystream Primitives
//!
//! Cryptographic building blocks for Entangle. Pure functions with
//! deterministic outputs. Nothing here touches storage, clocks or randomness;
//! callers own the counter and provide salts.
//!
//! # Keystream Lifecycle
//!
//! Two peers scan the same seed. Each hashes it into the same shared secret,
//! and from there both sides compute identical keystream blocks by feeding
//! `(secret, counter)` through a fixed-parameter PRF. Nothing but the seed
//! ever crosses between them.
//!
//! ```text
//! Seed (32 bytes, via QR)
//!        │
//!        ▼
//! SHA-256 → Shared Secret
//!        │
//!        ▼
//! PRF(secret, counter) → Keystream Block (32 bytes)
//!        │
//!        ▼
//! XOR → Ciphertext
//! ```
//!
//! # Security
//!
//! This is not a vetted cipher. It exists to reproduce a specific pairing
//! scheme so its behavior can be tested.
//!
//! Pad Uniqueness:
//! - Every block is bound to exactly one counter value
//! - Reusing a counter with the same secret reuses the pad and leaks the XOR
//!   of both plaintexts
//! - Counter discipline lives in `entangle-core`, not here
//!
//! No Integrity:
//! - Ciphertexts carry no tag; flipped bits flip plaintext bits
//!
//! Fixed Parameters:
//! - PRF parameters are public, versioned and identical on every peer
//! - All unpredictability comes from the secret and the counter

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod keystream;

pub use keystream::{
    BLOCK_LEN, COUNTER_SPACE, DEFAULT_MIN_SEED_LEN, FINGERPRINT_SALT_LEN, Fingerprint,
    KeystreamBlock, KeystreamError, PRF_INPUT_LEN, PRF_VERSION, Pad, ParameterTable, SECRET_LEN,
    SeedDefect, SharedSecret, apply_pad, apply_pad_in_place, derive_secret, expand_pad, parameters,
    prf,
};
