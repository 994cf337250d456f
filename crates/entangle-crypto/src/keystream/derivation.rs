//! Seed-to-secret derivation and secret fingerprints

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use super::{
    FINGERPRINT_SALT_LEN, SECRET_LEN,
    error::{KeystreamError, SeedDefect},
};

type HmacSha256 = Hmac<Sha256>;

/// Label mixed into every fingerprint
const FINGERPRINT_LABEL: &[u8] = b"entangle/fingerprint/v1";

/// The 32-byte secret both peers derive from the exchanged seed.
///
/// Never printed: `Debug` is redacted. Zeroized on drop.
#[derive(Clone)]
pub struct SharedSecret([u8; SECRET_LEN]);

impl SharedSecret {
    /// Wrap raw secret bytes, e.g. when restoring a persisted secret.
    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw secret bytes.
    pub fn as_bytes(&self) -> &[u8; SECRET_LEN] {
        &self.0
    }

    /// Salted fingerprint identifying this secret without revealing it.
    ///
    /// `HMAC-SHA256(key = secret, label || salt)`. The salt is chosen per
    /// pairing so fingerprints of the same secret differ across pairings.
    pub fn fingerprint(&self, salt: &[u8; FINGERPRINT_SALT_LEN]) -> Fingerprint {
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.0) else {
            unreachable!("HMAC-SHA256 accepts any key size");
        };
        mac.update(FINGERPRINT_LABEL);
        mac.update(salt);

        let mut out = [0u8; 32];
        out.copy_from_slice(&mac.finalize().into_bytes());
        Fingerprint(out)
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        // Constant-time over the full width
        self.0.iter().zip(other.0.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

impl Eq for SharedSecret {}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Salted HMAC fingerprint of a [`SharedSecret`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Wrap raw fingerprint bytes loaded from storage.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw fingerprint bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First four bytes as hex, safe for logs.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({}..)", self.short())
    }
}

/// Derive the shared secret from a seed: `SHA-256(seed)`.
///
/// # Errors
///
/// - `InvalidSeed(TooShort)` if `seed` is shorter than `min_len`
/// - `InvalidSeed(AllZero)` if every byte is zero
pub fn derive_secret(seed: &[u8], min_len: usize) -> Result<SharedSecret, KeystreamError> {
    if seed.len() < min_len {
        return Err(KeystreamError::InvalidSeed(SeedDefect::TooShort {
            len: seed.len(),
            min: min_len,
        }));
    }

    if seed.iter().all(|&b| b == 0) {
        return Err(KeystreamError::InvalidSeed(SeedDefect::AllZero));
    }

    Ok(SharedSecret(Sha256::digest(seed).into()))
}
