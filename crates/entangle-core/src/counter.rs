//! Persisted per-secret counter.
//!
//! The counter is the only thing that keeps two messages from sharing a pad,
//! so it moves strictly forward. Every reservation is a single
//! [`StateStore::update`], so any number of counter stores and sessions over
//! one backend serialize on the backend itself. The write completes before
//! the reserved range is returned. A caller that abandons the range
//! afterwards loses those blocks; they are never handed out again.

use entangle_crypto::{COUNTER_SPACE, Fingerprint};

use crate::{
    error::EngineError,
    record::{SecretBinding, StateRecord},
    storage::StateStore,
};

/// A contiguous range of counter values reserved for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// First reserved counter value
    pub first: u32,
    /// Number of reserved values
    pub blocks: u64,
    /// Persisted counter after the reservation
    pub next: u64,
}

/// Counter slot stored under one storage key.
#[derive(Clone)]
pub struct CounterStore<S: StateStore> {
    store: S,
    key: String,
}

impl<S: StateStore> CounterStore<S> {
    /// Counter slot at `key` in `store`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }

    /// Storage key of this slot.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load and validate the persisted record, if any.
    ///
    /// # Errors
    ///
    /// - `Storage` if the backend fails
    /// - `CorruptState` if the record does not decode
    pub fn load(&self) -> Result<Option<StateRecord>, EngineError> {
        match self.store.get(&self.key)? {
            Some(bytes) => StateRecord::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Binding of the persisted record, if any.
    pub fn binding(&self) -> Result<Option<SecretBinding>, EngineError> {
        Ok(self.load()?.map(|record| record.binding))
    }

    /// Current counter for the secret identified by `fingerprint`.
    ///
    /// # Errors
    ///
    /// - `NotEntangled` if nothing is persisted
    /// - `StateMismatch` if the record belongs to another secret
    /// - `CorruptState` or `Storage` from [`CounterStore::load`]
    pub fn get(&self, fingerprint: &Fingerprint) -> Result<u64, EngineError> {
        let bytes = self.store.get(&self.key)?;
        let record = owned_record(bytes.as_deref(), fingerprint)?;
        Ok(record.counter)
    }

    /// Reserve one counter value and return the new persisted counter.
    pub fn advance(&self, fingerprint: &Fingerprint) -> Result<u64, EngineError> {
        Ok(self.advance_by(fingerprint, 1)?.next)
    }

    /// Reserve `blocks` consecutive counter values.
    ///
    /// # Invariants
    ///
    /// - Post: on `Ok`, the advanced counter is durable in the store
    /// - Post: no value in the returned range was returned before for this
    ///   binding
    ///
    /// # Errors
    ///
    /// - `CounterExhausted` if the range would pass `2^32`; nothing is written
    /// - `Storage` if the write fails; the range is not handed out
    /// - the errors of [`CounterStore::get`]
    pub fn advance_by(
        &self,
        fingerprint: &Fingerprint,
        blocks: u64,
    ) -> Result<Reservation, EngineError> {
        let reservation = self.store.update(&self.key, |previous| {
            let mut record = owned_record(previous, fingerprint)?;
            let counter = record.counter;

            let exhausted = EngineError::CounterExhausted { counter, requested: blocks };
            let Ok(first) = u32::try_from(counter) else {
                return Err(exhausted);
            };
            let next = counter.saturating_add(blocks);
            if next > COUNTER_SPACE {
                return Err(exhausted);
            }

            debug_assert!(next > counter || blocks == 0);
            record.counter = next;
            Ok((record.encode()?, Reservation { first, blocks, next }))
        })?;

        tracing::debug!(
            fingerprint = %fingerprint.short(),
            first = reservation.first,
            blocks,
            next = reservation.next,
            "Reserved counter range"
        );
        Ok(reservation)
    }

    /// Rewrite the record for `fingerprint` without its stored secret.
    ///
    /// Returns true if a secret was removed. The counter is left untouched.
    ///
    /// # Errors
    ///
    /// - the errors of [`CounterStore::get`]
    pub fn forget_secret(&self, fingerprint: &Fingerprint) -> Result<bool, EngineError> {
        self.store.update(&self.key, |previous| {
            let mut record = owned_record(previous, fingerprint)?;
            let forgotten = record.binding.forget_secret();
            Ok((record.encode()?, forgotten))
        })
    }

    /// Replace the slot with a fresh record for `binding` at counter zero.
    ///
    /// Only pairing calls this. Keystream generation never resets.
    pub fn reset(&self, binding: SecretBinding) -> Result<(), EngineError> {
        self.store.set(&self.key, &StateRecord::fresh(binding).encode()?)?;
        Ok(())
    }

    /// Delete the persisted record.
    pub fn clear(&self) -> Result<(), EngineError> {
        self.store.remove(&self.key)?;
        Ok(())
    }
}

/// Decode `bytes` and check that the record belongs to `fingerprint`.
fn owned_record(
    bytes: Option<&[u8]>,
    fingerprint: &Fingerprint,
) -> Result<StateRecord, EngineError> {
    let record = StateRecord::decode(bytes.ok_or(EngineError::NotEntangled)?)?;
    if record.binding.fingerprint() != *fingerprint {
        return Err(EngineError::StateMismatch);
    }
    Ok(record)
}
