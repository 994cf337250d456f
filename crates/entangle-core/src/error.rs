//! Error types for the keystream engine.
//!
//! Every failure is reported synchronously to the caller. Nothing in the core
//! retries: re-scanning a seed or re-pairing is the caller's decision.

use entangle_crypto::{KeystreamError, SeedDefect};
use thiserror::Error;

use crate::{config::ConfigError, storage::StorageError};

/// Errors from sessions, counters and keystream generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Seed has the wrong length or is all zeros
    #[error("invalid seed: {0}")]
    InvalidSeed(SeedDefect),

    /// Operation needs an active secret but none is established
    #[error("not entangled: pair with a peer first")]
    NotEntangled,

    /// Requested keystream length is zero or above the configured bound
    #[error("invalid length: requested {requested} bytes, allowed 1..={max}")]
    InvalidLength {
        /// Bytes requested
        requested: usize,
        /// Upper bound
        max: usize,
    },

    /// Cipher input is longer than the pad
    #[error("pad too short: {data_len} data bytes, {pad_len} pad bytes")]
    PadTooShort {
        /// Bytes to transform
        data_len: usize,
        /// Pad bytes available
        pad_len: usize,
    },

    /// Persisted counter belongs to a different secret
    #[error("state mismatch: persisted counter belongs to a different secret")]
    StateMismatch,

    /// Persisted record is unreadable or malformed
    #[error("corrupt state: {reason}")]
    CorruptState {
        /// What was wrong with the record
        reason: String,
    },

    /// Counter space for this secret is used up
    #[error("counter exhausted: {requested} blocks requested at counter {counter}")]
    CounterExhausted {
        /// Persisted counter
        counter: u64,
        /// Blocks requested
        requested: u64,
    },

    /// Ciphertext is not valid Base64
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Engine configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage backend failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EngineError {
    /// Returns true if the pairing cannot continue and the peers must pair
    /// again.
    ///
    /// `StateMismatch` and `CorruptState` have already wiped the persisted
    /// record. `CounterExhausted` leaves it in place for diagnostics.
    pub fn requires_repairing(&self) -> bool {
        matches!(
            self,
            Self::StateMismatch | Self::CorruptState { .. } | Self::CounterExhausted { .. }
        )
    }

    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptState { reason: reason.into() }
    }
}

impl From<KeystreamError> for EngineError {
    fn from(err: KeystreamError) -> Self {
        match err {
            KeystreamError::InvalidSeed(defect) => Self::InvalidSeed(defect),
            KeystreamError::PadTooShort { data_len, pad_len } => {
                Self::PadTooShort { data_len, pad_len }
            },
            KeystreamError::CounterOverflow { start, blocks } => Self::CounterExhausted {
                counter: u64::from(start),
                requested: blocks as u64,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_closed_errors_require_repairing() {
        assert!(EngineError::StateMismatch.requires_repairing());
        assert!(EngineError::corrupt("bad cbor").requires_repairing());
        let exhausted = EngineError::CounterExhausted { counter: 1 << 32, requested: 1 };
        assert!(exhausted.requires_repairing());
    }

    #[test]
    fn caller_errors_do_not_require_repairing() {
        assert!(!EngineError::NotEntangled.requires_repairing());
        assert!(!EngineError::InvalidSeed(SeedDefect::AllZero).requires_repairing());
        assert!(!EngineError::InvalidLength { requested: 0, max: 1024 }.requires_repairing());
        assert!(!EngineError::PadTooShort { data_len: 2, pad_len: 1 }.requires_repairing());
        assert!(!EngineError::Storage(StorageError::Io("disk".into())).requires_repairing());
    }

    #[test]
    fn keystream_errors_map_to_engine_errors() {
        assert_eq!(
            EngineError::from(KeystreamError::PadTooShort { data_len: 5, pad_len: 4 }),
            EngineError::PadTooShort { data_len: 5, pad_len: 4 }
        );
        assert_eq!(
            EngineError::from(KeystreamError::InvalidSeed(SeedDefect::AllZero)),
            EngineError::InvalidSeed(SeedDefect::AllZero)
        );
    }
}
