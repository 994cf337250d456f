//! Storage abstraction for persisted keystream state
//!
//! A get/set/remove byte-blob interface keyed by a fixed storage identifier,
//! plus an atomic read-modify-write. The trait is synchronous (no async):
//! every write must be durable before a keystream block derived from it is
//! handed out.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticStore;
pub use error::StorageError;
pub use memory::MemoryStore;

pub use self::redb::RedbStore;

/// Byte-blob storage for the persisted state record.
///
/// Must be Clone (the counter store and diagnostics share it), Send + Sync
/// (thread-safe), and synchronous. Implementations typically share internal
/// state via Arc, so clones access the same underlying storage.
pub trait StateStore: Clone + Send + Sync + 'static {
    /// Load the value stored under `key`.
    ///
    /// Returns `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Invariants
    ///
    /// - Post: on `Ok`, the value is durable (survives restart for durable
    ///   backends)
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove the value under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Read the value under `key`, let `f` compute its replacement, and write
    /// it, all as one atomic step.
    ///
    /// `f` returns the bytes to store and a value handed back to the caller.
    /// If `f` fails nothing is written.
    ///
    /// # Invariants
    ///
    /// - Two concurrent updates of the same key through any clones of one
    ///   store never observe the same previous value
    /// - Post: on `Ok`, the new value is durable
    fn update<T, E>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&[u8]>) -> Result<(Vec<u8>, T), E>,
    ) -> Result<T, E>
    where
        E: From<StorageError>;
}
