//! Environment abstraction for deterministic testing.
//!
//! Decouples pairing logic from system randomness. Enables deterministic
//! simulation with a seeded RNG and production use with the OS RNG.

/// Abstract environment providing randomness.
///
/// Randomness is only ever used for fresh seeds and fingerprint salts. The
/// keystream itself never touches it.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);
}
