//! Storage error types.

use thiserror::Error;

/// Errors raised by [`super::StateStore`] backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend I/O or transaction failure
    #[error("storage I/O error: {0}")]
    Io(String),

    /// Record could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),
}
