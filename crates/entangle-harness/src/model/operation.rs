//! Operations for model-based testing.
//!
//! Operations represent all possible actions on a pair of peers. They are
//! generated randomly by proptest or the fuzzer and applied to both the model
//! and the real twins.

use arbitrary::Arbitrary;
use entangle_core::{BLOCK_LEN, EngineError};

use crate::twin::PeerId;

/// Operations that can be applied to the twins.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Alice shows a fresh seed and Bob scans it.
    Pair,

    /// Encrypt at `from` and decrypt at the other peer.
    Send {
        /// Sending peer
        from: PeerId,
        /// Message content
        content: SmallMessage,
    },

    /// Encrypt at `from`; the message never arrives.
    ///
    /// The sender's counter moves ahead of the receiver's.
    Lose {
        /// Sending peer
        from: PeerId,
        /// Message content
        content: SmallMessage,
    },

    /// Rebuild a peer's session over its surviving store.
    Restart {
        /// Peer to restart
        peer: PeerId,
    },

    /// One peer unpairs locally.
    Unpair {
        /// Peer that unpairs
        peer: PeerId,
    },
}

/// Small message content for testing.
///
/// Never empty and at least 8 bytes, so a message decrypted under the wrong
/// pad differs from the original except with negligible probability.
#[derive(Debug, Clone, Arbitrary)]
pub struct SmallMessage {
    /// First character offset
    pub seed: u8,
    /// Length class (0-3 maps to 8/33/100/1024 bytes)
    pub size_class: u8,
}

impl SmallMessage {
    /// Expand to printable ASCII text.
    pub fn to_text(&self) -> String {
        let len = match self.size_class % 4 {
            0 => 8,
            1 => 33,
            2 => 100,
            _ => 1024,
        };

        (0..len).map(|i| char::from(b'a' + (self.seed.wrapping_add(i as u8) % 26))).collect()
    }

    /// Counter values one encryption of this message consumes.
    pub fn blocks(&self) -> u64 {
        self.to_text().len().div_ceil(BLOCK_LEN) as u64
    }
}

/// Result of applying an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded.
    Ok,

    /// Message reached the receiver.
    Delivered {
        /// Receiver recovered the original text
        intact: bool,
    },

    /// Operation failed with an expected error.
    Error(OperationError),
}

/// Expected errors that can occur during operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Sender has no active secret.
    SenderNotEntangled,

    /// Receiver has no active secret; the sender's counter still moved.
    ReceiverNotEntangled,

    /// Any other engine error, which the model never predicts.
    Unexpected(String),
}

impl OperationError {
    /// Classify a receiver-side engine error.
    pub fn at_receiver(err: &EngineError) -> Self {
        match err {
            EngineError::NotEntangled => Self::ReceiverNotEntangled,
            other => Self::Unexpected(other.to_string()),
        }
    }

    /// Classify a sender-side engine error.
    pub fn at_sender(err: &EngineError) -> Self {
        match err {
            EngineError::NotEntangled => Self::SenderNotEntangled,
            other => Self::Unexpected(other.to_string()),
        }
    }
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Error(_))
    }
}
