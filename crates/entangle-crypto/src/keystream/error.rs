//! Keystream error types.

use thiserror::Error;

/// Why a seed was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedDefect {
    /// Seed is shorter than the configured minimum
    #[error("seed is {len} bytes, minimum is {min}")]
    TooShort {
        /// Length supplied
        len: usize,
        /// Minimum accepted
        min: usize,
    },

    /// Seed does not have the exact transport length
    #[error("seed is {len} bytes, expected exactly {expected}")]
    WrongLength {
        /// Length supplied
        len: usize,
        /// Required length
        expected: usize,
    },

    /// Seed is all zero bytes
    #[error("seed is all zeros")]
    AllZero,

    /// Transport payload is not valid Base64
    #[error("seed payload is not valid Base64")]
    NotBase64,
}

/// Errors from keystream primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeystreamError {
    /// Seed was rejected before derivation
    #[error("invalid seed: {0}")]
    InvalidSeed(SeedDefect),

    /// Cipher input is longer than the pad
    #[error("pad too short: {data_len} data bytes, {pad_len} pad bytes")]
    PadTooShort {
        /// Bytes to transform
        data_len: usize,
        /// Pad bytes available
        pad_len: usize,
    },

    /// Block range runs past the last 32-bit counter value
    #[error("counter overflow: {blocks} blocks from counter {start}")]
    CounterOverflow {
        /// First counter of the range
        start: u32,
        /// Blocks requested
        blocks: usize,
    },
}
