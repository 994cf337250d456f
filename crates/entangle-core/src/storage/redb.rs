//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. A
//! `set` returns only after its write transaction has committed, so a counter
//! reservation is durable before the matching keystream block exists.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};

use super::{StateStore, StorageError};

/// Table: state
/// Key: storage identifier (e.g. `entangled_state`)
/// Value: CBOR-encoded state record
const STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("state");

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the STATE table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(STATE).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl StateStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;

        let table = txn.open_table(STATE).map_err(|e| StorageError::Io(e.to_string()))?;

        let value = table.get(key).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;

        {
            let mut table = txn.open_table(STATE).map_err(|e| StorageError::Io(e.to_string()))?;
            table.insert(key, value).map_err(|e| StorageError::Io(e.to_string()))?;
        }

        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;

        {
            let mut table = txn.open_table(STATE).map_err(|e| StorageError::Io(e.to_string()))?;
            table.remove(key).map_err(|e| StorageError::Io(e.to_string()))?;
        }

        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    /// Runs `f` inside one write transaction.
    ///
    /// Redb admits a single writer at a time, so the read and the write
    /// cannot interleave with another update through the same database.
    fn update<T, E>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&[u8]>) -> Result<(Vec<u8>, T), E>,
    ) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;

        let output = {
            let mut table = txn.open_table(STATE).map_err(|e| StorageError::Io(e.to_string()))?;
            let previous = table
                .get(key)
                .map_err(|e| StorageError::Io(e.to_string()))?
                .map(|v| v.value().to_vec());

            let (value, output) = f(previous.as_deref())?;
            table.insert(key, value.as_slice()).map_err(|e| StorageError::Io(e.to_string()))?;
            output
        };

        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_open_creates_empty_store() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("state.redb")).unwrap();

        assert_eq!(store.get("entangled_state").unwrap(), None);
    }

    #[test]
    fn test_set_get_remove() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("state.redb")).unwrap();

        store.set("entangled_state", b"record").unwrap();
        assert_eq!(store.get("entangled_state").unwrap(), Some(b"record".to_vec()));

        store.remove("entangled_state").unwrap();
        assert_eq!(store.get("entangled_state").unwrap(), None);
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("state.redb")).unwrap();

        assert!(store.remove("absent").is_ok());
    }

    #[test]
    fn test_update_is_atomic_across_threads() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("state.redb")).unwrap();
        store.set("entangled_state", &0u64.to_be_bytes()).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..2 {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..50 {
                        let result: Result<(), StorageError> =
                            store.update("entangled_state", |previous| {
                                let bytes: [u8; 8] = previous.unwrap().try_into().unwrap();
                                Ok(((u64::from_be_bytes(bytes) + 1).to_be_bytes().to_vec(), ()))
                            });
                        result.unwrap();
                    }
                });
            }
        });

        assert_eq!(store.get("entangled_state").unwrap(), Some(100u64.to_be_bytes().to_vec()));
    }

    #[test]
    fn test_failed_update_rolls_back() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("state.redb")).unwrap();
        store.set("entangled_state", b"kept").unwrap();

        let result: Result<(), StorageError> =
            store.update("entangled_state", |_| Err(StorageError::Io("refused".into())));

        assert!(result.is_err());
        assert_eq!(store.get("entangled_state").unwrap(), Some(b"kept".to_vec()));
    }

    #[test]
    fn test_value_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            store.set("entangled_state", &[7u8; 64]).unwrap();
            // Database dropped
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("entangled_state").unwrap(), Some(vec![7u8; 64]));
    }
}
