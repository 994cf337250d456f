//! Pairing seeds and their QR transport encoding.
//!
//! A seed is 32 random bytes carried to the peer as standard Base64 inside a
//! QR code. Decoding checks the exact length and rejects all-zero buffers
//! before anything is derived from it.

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use entangle_crypto::SeedDefect;
use zeroize::Zeroize;

use crate::{env::Environment, error::EngineError};

/// Exact seed length on the wire.
pub const SEED_LEN: usize = 32;

/// A validated pairing seed.
///
/// `Debug` shows only the first two bytes. Wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    /// Draw a fresh random seed.
    ///
    /// Redraws in the astronomically unlikely all-zero case.
    pub fn generate(env: &impl Environment) -> Self {
        let mut bytes = [0u8; SEED_LEN];
        loop {
            env.random_bytes(&mut bytes);
            if bytes.iter().any(|&b| b != 0) {
                return Self(bytes);
            }
        }
    }

    /// Validate raw seed bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidSeed(WrongLength)` unless exactly 32 bytes
    /// - `InvalidSeed(AllZero)` if every byte is zero
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        let Ok(array) = <[u8; SEED_LEN]>::try_from(bytes) else {
            return Err(EngineError::InvalidSeed(SeedDefect::WrongLength {
                len: bytes.len(),
                expected: SEED_LEN,
            }));
        };

        if array.iter().all(|&b| b == 0) {
            return Err(EngineError::InvalidSeed(SeedDefect::AllZero));
        }

        Ok(Self(array))
    }

    /// Decode a scanned QR payload.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// - `InvalidSeed` if the payload is not Base64 or fails
    ///   [`Seed::from_bytes`]
    pub fn from_base64(encoded: &str) -> Result<Self, EngineError> {
        let mut bytes = BASE64
            .decode(encoded.trim())
            .map_err(|_| EngineError::InvalidSeed(SeedDefect::NotBase64))?;

        let seed = Self::from_bytes(&bytes);
        bytes.zeroize();
        seed
    }

    /// Encode for QR display.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Raw seed bytes.
    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

impl Drop for Seed {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct FixedEnv(u8);

    impl Environment for FixedEnv {
        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(self.0);
        }
    }

    #[test]
    fn generate_uses_environment() {
        let seed = Seed::generate(&FixedEnv(0x42));
        assert_eq!(seed.as_bytes(), &[0x42; SEED_LEN]);
    }

    #[test]
    fn base64_roundtrip() {
        let seed = Seed::generate(&FixedEnv(0x11));
        let encoded = seed.to_base64();

        assert_eq!(Seed::from_base64(&encoded).unwrap(), seed);
    }

    #[test]
    fn from_base64_ignores_surrounding_whitespace() {
        let seed = Seed::generate(&FixedEnv(0x11));
        let encoded = format!("  {}\n", seed.to_base64());

        assert_eq!(Seed::from_base64(&encoded).unwrap(), seed);
    }

    #[test]
    fn rejects_wrong_length() {
        let result = Seed::from_bytes(&[1u8; 31]);
        assert_eq!(
            result.unwrap_err(),
            EngineError::InvalidSeed(SeedDefect::WrongLength { len: 31, expected: 32 })
        );

        let encoded = BASE64.encode([1u8; 33]);
        assert!(matches!(Seed::from_base64(&encoded), Err(EngineError::InvalidSeed(_))));
    }

    #[test]
    fn rejects_all_zero() {
        let encoded = BASE64.encode([0u8; SEED_LEN]);

        assert_eq!(
            Seed::from_base64(&encoded).unwrap_err(),
            EngineError::InvalidSeed(SeedDefect::AllZero)
        );
    }

    #[test]
    fn rejects_non_base64() {
        assert_eq!(
            Seed::from_base64("quantum_seed_1700000000").unwrap_err(),
            EngineError::InvalidSeed(SeedDefect::NotBase64)
        );
    }

    #[test]
    fn debug_shows_prefix_only() {
        let seed = Seed::generate(&FixedEnv(0xAB));
        assert_eq!(format!("{seed:?}"), "Seed(abab..)");
    }
}
