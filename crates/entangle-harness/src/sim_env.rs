//! Deterministic environment for simulation.

use std::sync::{Arc, Mutex, PoisonError};

use entangle_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded environment: the same seed yields the same seeds and salts.
///
/// Clones share one RNG stream, so two peers built from clones of one
/// `SimEnv` draw different (but reproducible) bytes.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Environment seeded with zero.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))) }
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
