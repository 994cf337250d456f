//! Production Environment implementation using the OS RNG.

use crate::env::Environment;

/// Production environment backed by getrandom.
///
/// # Security
///
/// The RNG uses getrandom which provides OS-level cryptographic randomness
/// (e.g., /dev/urandom on Linux, `BCryptGenRandom` on Windows). Seeds shown
/// to a peer come from here.
///
/// # Panics
///
/// Panics if the OS RNG fails. A pairing seed drawn from a broken RNG would
/// be guessable, so there is no fallback.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - cannot generate seeds securely");
    }
}
