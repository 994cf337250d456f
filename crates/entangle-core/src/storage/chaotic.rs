//! Chaotic storage wrapper for fault injection testing
//!
//! Storage wrapper that randomly fails operations to test error handling and
//! recovery. Used for chaos testing to ensure a failed counter write never
//! hands out a keystream block and never causes a counter to be reused.

use std::sync::{Arc, Mutex};

use super::{StateStore, StorageError};

/// Chaotic storage wrapper that randomly injects failures
///
/// Delegates to an underlying storage implementation but randomly fails
/// operations based on a configured failure rate. Uses Arc<Mutex<>> for the
/// RNG state, making it Clone and thread-safe.
#[derive(Clone)]
pub struct ChaoticStore<S: StateStore> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    /// Operation counter for performance testing
    operation_count: Arc<Mutex<usize>>,
}

/// Simple deterministic RNG for chaos injection
///
/// Uses linear congruential generator (LCG) for fast, deterministic randomness.
/// This ensures chaos tests are reproducible with the same seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate next random value [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }

    /// Check if we should fail (returns true with probability = `failure_rate`)
    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<S: StateStore> ChaoticStore<S> {
    /// Create a new chaotic storage wrapper
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Underlying storage (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of storage operations attempted.
    pub fn operation_count(&self) -> usize {
        #[allow(clippy::expect_used)]
        *self.operation_count.lock().expect("operation_count mutex poisoned")
    }

    /// Increment operation counter
    fn increment_operation_count(&self) {
        #[allow(clippy::expect_used)]
        let mut count = self.operation_count.lock().expect("operation_count mutex poisoned");
        *count += 1;
    }

    /// Check if this operation should fail
    fn should_fail(&self) -> bool {
        #[allow(clippy::expect_used)]
        self.rng.lock().expect("ChaoticRng mutex poisoned").should_fail(self.failure_rate)
    }

    fn inject(&self) -> Result<(), StorageError> {
        self.increment_operation_count();
        if self.should_fail() {
            return Err(StorageError::Io("chaotic failure injection".to_string()));
        }
        Ok(())
    }
}

impl<S: StateStore> StateStore for ChaoticStore<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inject()?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.inject()?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inject()?;
        self.inner.remove(key)
    }

    fn update<T, E>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&[u8]>) -> Result<(Vec<u8>, T), E>,
    ) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        self.inject()?;
        self.inner.update(key, f)
    }
}
