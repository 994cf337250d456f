//! Synchronized keystream: secret derivation, PRF and XOR pad.

mod cipher;
mod derivation;
mod error;
mod prf;

pub use cipher::{Pad, apply_pad, apply_pad_in_place, expand_pad};
pub use derivation::{Fingerprint, SharedSecret, derive_secret};
pub use error::{KeystreamError, SeedDefect};
pub use prf::{KeystreamBlock, ParameterTable, parameters, prf};

/// Length of the shared secret in bytes.
pub const SECRET_LEN: usize = 32;

/// Width of one PRF output block in bytes.
pub const BLOCK_LEN: usize = 32;

/// PRF input width: secret followed by the little-endian `u32` counter.
pub const PRF_INPUT_LEN: usize = SECRET_LEN + 4;

/// Minimum seed length accepted by [`derive_secret`] unless configured
/// otherwise.
pub const DEFAULT_MIN_SEED_LEN: usize = 16;

/// Length of the per-pairing fingerprint salt.
pub const FINGERPRINT_SALT_LEN: usize = 16;

/// Version of the pinned PRF parameter recipe.
///
/// Peers with different versions compute different keystreams and can never
/// interoperate.
pub const PRF_VERSION: u16 = 1;

/// Number of distinct counter values (blocks) available per secret.
pub const COUNTER_SPACE: u64 = 1 << 32;
