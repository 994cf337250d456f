use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{StateStore, StorageError};

/// In-memory storage implementation for testing and simulation
///
/// All state is wrapped in Arc<Mutex<>> to allow Clone and concurrent access.
/// Clones share the same map, so a clone handed to a "restarted" session sees
/// everything the previous session wrote.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create a new empty `MemoryStore`
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    ///
    /// Useful for debugging and testing.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned (a thread panicked while
    /// holding the lock). This is acceptable for test/simulation code.
    #[allow(clippy::expect_used)]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite a raw value, bypassing any record encoding.
    ///
    /// Lets tests plant corrupt or foreign state.
    #[allow(clippy::expect_used)]
    pub fn insert_raw(&self, key: &str, value: Vec<u8>) {
        self.inner.lock().expect("Mutex poisoned").insert(key.to_owned(), value);
    }
}

impl StateStore for MemoryStore {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").get(key).cloned())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.inner.lock().expect("Mutex poisoned").insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.lock().expect("Mutex poisoned").remove(key);
        Ok(())
    }

    /// Runs `f` while holding the map lock.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for test
    /// code.
    #[allow(clippy::expect_used)]
    fn update<T, E>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&[u8]>) -> Result<(Vec<u8>, T), E>,
    ) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        let (value, output) = f(inner.get(key).map(Vec::as_slice))?;
        inner.insert(key.to_owned(), value);
        Ok(output)
    }
}
