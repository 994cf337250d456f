//! Keystream generation over a persisted counter.

use entangle_crypto::{BLOCK_LEN, Fingerprint, Pad, SharedSecret, expand_pad};

use crate::{counter::CounterStore, error::EngineError, storage::StateStore};

/// Produces pads for one established secret.
///
/// Each request reserves `ceil(len / 32)` counter values before any block is
/// computed. The generator never resets its counter.
pub struct KeystreamGenerator<S: StateStore> {
    secret: SharedSecret,
    fingerprint: Fingerprint,
    counters: CounterStore<S>,
    max_request_len: usize,
}

impl<S: StateStore> KeystreamGenerator<S> {
    /// Generator for `secret`, whose persisted binding has `fingerprint`.
    pub fn new(
        secret: SharedSecret,
        fingerprint: Fingerprint,
        counters: CounterStore<S>,
        max_request_len: usize,
    ) -> Self {
        Self { secret, fingerprint, counters, max_request_len }
    }

    /// Fingerprint of the active binding.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Persisted counter.
    pub fn counter(&self) -> Result<u64, EngineError> {
        self.counters.get(&self.fingerprint)
    }

    /// Next `len` keystream bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidLength` if `len` is zero or above the configured bound
    /// - errors of [`CounterStore::advance_by`]; no pad is produced and
    ///   nothing is handed out twice
    pub fn next_bytes(&self, len: usize) -> Result<Pad, EngineError> {
        if len == 0 || len > self.max_request_len {
            return Err(EngineError::InvalidLength { requested: len, max: self.max_request_len });
        }

        let blocks = len.div_ceil(BLOCK_LEN);
        let reservation = self.counters.advance_by(&self.fingerprint, blocks as u64)?;
        let pad = expand_pad(&self.secret, reservation.first, len)?;

        debug_assert_eq!(pad.len(), len);
        debug_assert_eq!(pad.blocks(), blocks);
        Ok(pad)
    }
}
