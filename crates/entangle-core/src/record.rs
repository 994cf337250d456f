//! Persisted state record.
//!
//! One CBOR record per storage key ties the counter to the secret it belongs
//! to. The secret itself is identified by a salted fingerprint; whether the
//! raw secret is stored alongside is a configuration choice
//! ([`SecretPersistence`]).
//!
//! Decoding is strict. A record from another format or PRF version, a counter
//! outside the 32-bit block space, or a stored secret that disagrees with its
//! own fingerprint is reported as `CorruptState`.

use entangle_crypto::{
    COUNTER_SPACE, FINGERPRINT_SALT_LEN, Fingerprint, PRF_VERSION, SECRET_LEN, SharedSecret,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{config::SecretPersistence, error::EngineError, storage::StorageError};

/// Current record layout version.
pub const RECORD_FORMAT: u16 = 1;

/// The persisted (salt, fingerprint, optional secret) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretBinding {
    salt: [u8; FINGERPRINT_SALT_LEN],
    fingerprint: Fingerprint,
    secret: Option<SharedSecret>,
}

impl SecretBinding {
    /// Bind `secret` under a fresh `salt`.
    ///
    /// The secret is kept in the binding only when `persistence` is
    /// [`SecretPersistence::Secret`].
    pub fn new(
        secret: &SharedSecret,
        salt: [u8; FINGERPRINT_SALT_LEN],
        persistence: SecretPersistence,
    ) -> Self {
        let fingerprint = secret.fingerprint(&salt);
        let secret = match persistence {
            SecretPersistence::Secret => Some(secret.clone()),
            SecretPersistence::FingerprintOnly => None,
        };
        Self { salt, fingerprint, secret }
    }

    /// Fingerprint salt.
    pub fn salt(&self) -> &[u8; FINGERPRINT_SALT_LEN] {
        &self.salt
    }

    /// Salted fingerprint of the bound secret.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// The persisted secret, if the binding carries one.
    pub fn stored_secret(&self) -> Option<&SharedSecret> {
        self.secret.as_ref()
    }

    /// Drop the persisted secret, keeping salt and fingerprint.
    ///
    /// Returns true if the binding carried one.
    pub fn forget_secret(&mut self) -> bool {
        self.secret.take().is_some()
    }

    /// True if `secret` is the secret this binding was made for.
    pub fn matches(&self, secret: &SharedSecret) -> bool {
        secret.fingerprint(&self.salt) == self.fingerprint
    }
}

/// A decoded, validated state record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRecord {
    /// Which secret the counter belongs to
    pub binding: SecretBinding,
    /// Next unused counter value. At most `2^32`.
    pub counter: u64,
}

/// On-disk layout. Field order is part of the format.
#[derive(Serialize, Deserialize)]
struct WireRecord {
    format: u16,
    prf_version: u16,
    salt: [u8; FINGERPRINT_SALT_LEN],
    fingerprint: [u8; 32],
    counter: u64,
    secret: Option<[u8; SECRET_LEN]>,
}

impl Drop for WireRecord {
    fn drop(&mut self) {
        if let Some(secret) = self.secret.as_mut() {
            secret.zeroize();
        }
    }
}

impl StateRecord {
    /// Record for a freshly established binding.
    pub fn fresh(binding: SecretBinding) -> Self {
        Self { binding, counter: 0 }
    }

    /// Serialize to CBOR.
    ///
    /// # Errors
    ///
    /// - `StorageError::Serialization` if CBOR encoding fails
    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        let wire = WireRecord {
            format: RECORD_FORMAT,
            prf_version: PRF_VERSION,
            salt: self.binding.salt,
            fingerprint: *self.binding.fingerprint.as_bytes(),
            counter: self.counter,
            secret: self.binding.secret.as_ref().map(|s| *s.as_bytes()),
        };

        let mut bytes = Vec::new();
        ciborium::into_writer(&wire, &mut bytes)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Parse and validate a CBOR record.
    ///
    /// # Errors
    ///
    /// - `CorruptState` if the bytes are not a record, the format or PRF
    ///   version is unknown, the counter is out of range, or a stored secret
    ///   does not match the stored fingerprint
    pub fn decode(bytes: &[u8]) -> Result<Self, EngineError> {
        let wire: WireRecord = ciborium::from_reader(bytes)
            .map_err(|e| EngineError::corrupt(format!("undecodable record: {e}")))?;

        if wire.format != RECORD_FORMAT {
            return Err(EngineError::corrupt(format!("unknown record format {}", wire.format)));
        }
        if wire.prf_version != PRF_VERSION {
            return Err(EngineError::corrupt(format!(
                "record written for PRF version {}, running {PRF_VERSION}",
                wire.prf_version
            )));
        }
        if wire.counter > COUNTER_SPACE {
            return Err(EngineError::corrupt(format!(
                "counter {} outside the block space",
                wire.counter
            )));
        }

        let binding = SecretBinding {
            salt: wire.salt,
            fingerprint: Fingerprint::from_bytes(wire.fingerprint),
            secret: wire.secret.map(SharedSecret::from_bytes),
        };

        if binding.stored_secret().is_some_and(|secret| !binding.matches(secret)) {
            return Err(EngineError::corrupt("stored secret does not match its fingerprint"));
        }

        Ok(Self { binding, counter: wire.counter })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_secret() -> SharedSecret {
        SharedSecret::from_bytes([0x5A; SECRET_LEN])
    }

    fn encode_wire(wire: &WireRecord) -> Vec<u8> {
        let mut bytes = Vec::new();
        ciborium::into_writer(wire, &mut bytes).unwrap();
        bytes
    }

    fn valid_wire() -> WireRecord {
        let binding = SecretBinding::new(&sample_secret(), [7; 16], SecretPersistence::Secret);
        WireRecord {
            format: RECORD_FORMAT,
            prf_version: PRF_VERSION,
            salt: binding.salt,
            fingerprint: *binding.fingerprint.as_bytes(),
            counter: 3,
            secret: Some([0x5A; SECRET_LEN]),
        }
    }

    #[test]
    fn fingerprint_only_binding_omits_secret() {
        let binding = SecretBinding::new(
            &sample_secret(),
            [1; FINGERPRINT_SALT_LEN],
            SecretPersistence::FingerprintOnly,
        );

        assert!(binding.stored_secret().is_none());
        assert!(binding.matches(&sample_secret()));
        assert!(!binding.matches(&SharedSecret::from_bytes([0x5B; SECRET_LEN])));
    }

    #[test]
    fn salt_changes_fingerprint() {
        let a = SecretBinding::new(&sample_secret(), [1; 16], SecretPersistence::FingerprintOnly);
        let b = SecretBinding::new(&sample_secret(), [2; 16], SecretPersistence::FingerprintOnly);

        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn encode_decode_preserves_record() {
        for persistence in [SecretPersistence::FingerprintOnly, SecretPersistence::Secret] {
            let binding = SecretBinding::new(&sample_secret(), [9; 16], persistence);
            let record = StateRecord { binding, counter: 41 };

            let decoded = StateRecord::decode(&record.encode().unwrap()).unwrap();

            assert_eq!(decoded, record);
        }
    }

    #[test]
    fn fingerprint_only_record_contains_no_secret() {
        let binding =
            SecretBinding::new(&sample_secret(), [9; 16], SecretPersistence::FingerprintOnly);
        let bytes = StateRecord::fresh(binding).encode().unwrap();

        let wire: WireRecord = ciborium::from_reader(&bytes[..]).unwrap();
        assert!(wire.secret.is_none());
        assert_eq!(wire.counter, 0);
    }

    #[test]
    fn rejects_garbage() {
        let err = StateRecord::decode(b"not a record").unwrap_err();
        assert!(matches!(err, EngineError::CorruptState { .. }));
    }

    #[test]
    fn rejects_unknown_format() {
        let mut wire = valid_wire();
        wire.format = 2;

        let err = StateRecord::decode(&encode_wire(&wire)).unwrap_err();
        assert!(matches!(err, EngineError::CorruptState { .. }));
    }

    #[test]
    fn rejects_other_prf_version() {
        let mut wire = valid_wire();
        wire.prf_version = PRF_VERSION + 1;

        let err = StateRecord::decode(&encode_wire(&wire)).unwrap_err();
        assert!(matches!(err, EngineError::CorruptState { .. }));
    }

    #[test]
    fn counter_range_is_checked() {
        let mut wire = valid_wire();
        wire.counter = COUNTER_SPACE;
        assert!(StateRecord::decode(&encode_wire(&wire)).is_ok());

        wire.counter = COUNTER_SPACE + 1;
        let err = StateRecord::decode(&encode_wire(&wire)).unwrap_err();
        assert!(matches!(err, EngineError::CorruptState { .. }));
    }

    #[test]
    fn rejects_secret_fingerprint_disagreement() {
        let mut wire = valid_wire();
        wire.secret = Some([0x5B; SECRET_LEN]);

        let err = StateRecord::decode(&encode_wire(&wire)).unwrap_err();
        assert!(matches!(err, EngineError::CorruptState { .. }));
    }
}
