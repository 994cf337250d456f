//! Entangle Core
//!
//! Synchronized keystream engine. Two peers that scanned the same seed derive
//! the same secret and, by advancing identical persisted counters, the same
//! sequence of pads. This crate owns everything stateful around the pure
//! primitives in `entangle-crypto`: seeds, the persisted counter, pairing and
//! fail-closed recovery.
//!
//! # Architecture
//!
//! ```text
//! Session (pairing lifecycle, fail-closed)
//!    │
//!    ├── KeystreamGenerator ── expand_pad (entangle-crypto)
//!    │        │
//!    │        ▼
//!    └── CounterStore (lock + read-increment-write)
//!             │
//!             ▼
//!        StateStore (Memory / Redb / Chaotic)
//! ```
//!
//! Randomness comes only from an injected [`Environment`], so simulations are
//! reproducible from a single RNG seed.
//!
//! # Counter Discipline
//!
//! - A counter value is persisted as used before its block is computed
//! - Counters only move forward; only pairing resets them
//! - A record that belongs to another secret, or cannot be read, is wiped
//!   rather than guessed around

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod counter;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod keystream;
pub mod record;
pub mod seed;
pub mod session;
pub mod storage;
pub mod system_env;

pub use config::{
    ConfigError, DEFAULT_MAX_REQUEST_LEN, DEFAULT_STATE_KEY, EngineConfig, SecretPersistence,
};
pub use counter::{CounterStore, Reservation};
pub use diagnostics::{Diagnostics, Health};
pub use entangle_crypto::{BLOCK_LEN, COUNTER_SPACE, Fingerprint, Pad};
pub use env::Environment;
pub use error::EngineError;
pub use keystream::KeystreamGenerator;
pub use record::{RECORD_FORMAT, SecretBinding, StateRecord};
pub use seed::{SEED_LEN, Seed};
pub use session::{Restored, Session};
pub use storage::{ChaoticStore, MemoryStore, RedbStore, StateStore, StorageError};
pub use system_env::SystemEnv;
