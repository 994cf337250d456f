//! Pairing lifecycle and the text cipher surface.
//!
//! A [`Session`] owns at most one active secret together with the counter
//! slot it is bound to. It is the only place that resets a counter, and the
//! only place that decides to fail closed.
//!
//! # Lifecycle
//!
//! ```text
//!            establish / regenerate
//!   Unpaired ───────────────────────► Entangled ──┐ next_bytes / encrypt
//!      ▲                                  ▲  │    │ decrypt
//!      │ disentangle, mismatch, corrupt   │  └────┘
//!      └──────────────────────────────────┤
//!                                         │ restore (secret persisted)
//!   Dormant ──────────────────────────────┘ resume(seed)
//! ```
//!
//! `StateMismatch` and `CorruptState` wipe the persisted record and drop the
//! secret. Continuing from a guessed counter could reuse a pad.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use entangle_crypto::{FINGERPRINT_SALT_LEN, Pad, SharedSecret, apply_pad, derive_secret};

use crate::{
    config::{EngineConfig, SecretPersistence},
    counter::CounterStore,
    diagnostics::Diagnostics,
    env::Environment,
    error::EngineError,
    keystream::KeystreamGenerator,
    record::SecretBinding,
    seed::Seed,
    storage::StateStore,
};

/// Outcome of [`Session::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restored {
    /// Nothing persisted
    Fresh,
    /// Persisted secret loaded; keystream continues at `counter`
    Resumed {
        /// Next counter value
        counter: u64,
    },
    /// Binding persisted without its secret; call [`Session::resume`]
    AwaitingSeed {
        /// Next counter value
        counter: u64,
    },
}

/// One peer's side of a pairing.
pub struct Session<S: StateStore, E: Environment> {
    env: E,
    config: EngineConfig,
    counters: CounterStore<S>,
    active: Option<KeystreamGenerator<S>>,
}

impl<S: StateStore, E: Environment> Session<S, E> {
    /// Unpaired session over `store`.
    ///
    /// Does not touch storage; call [`Session::restore`] to pick up persisted
    /// state.
    ///
    /// # Errors
    ///
    /// - `Config` if `config` fails validation
    pub fn new(store: S, env: E, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let counters = CounterStore::new(store, config.state_key.clone());
        Ok(Self { env, config, counters, active: None })
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// True if a secret is active.
    pub fn is_entangled(&self) -> bool {
        self.active.is_some()
    }

    /// Load persisted state after a restart.
    ///
    /// A record that carries a secret is resumed. If the configuration keeps
    /// only fingerprints, the secret is removed from storage first.
    ///
    /// # Errors
    ///
    /// - `CorruptState` after wiping an unreadable record
    /// - `Storage` if the backend fails
    pub fn restore(&mut self) -> Result<Restored, EngineError> {
        self.active = None;
        let loaded = self.counters.load();
        let Some(record) = self.guard(loaded)? else {
            return Ok(Restored::Fresh);
        };

        let counter = record.counter;
        let Some(secret) = record.binding.stored_secret().cloned() else {
            tracing::info!(
                fingerprint = %record.binding.fingerprint().short(),
                counter,
                "Restored binding, awaiting seed"
            );
            return Ok(Restored::AwaitingSeed { counter });
        };

        if self.config.secret_persistence == SecretPersistence::FingerprintOnly {
            let fingerprint = record.binding.fingerprint();
            let forgotten = self.counters.forget_secret(&fingerprint);
            if self.guard(forgotten)? {
                tracing::info!(
                    fingerprint = %fingerprint.short(),
                    "Removed persisted secret, configuration keeps fingerprint only"
                );
            }
        }

        self.activate(secret, &record.binding);
        tracing::info!(
            fingerprint = %record.binding.fingerprint().short(),
            counter,
            "Restored persisted secret"
        );
        Ok(Restored::Resumed { counter })
    }

    /// Pair with `seed`, replacing any previous pairing.
    ///
    /// Draws a fresh fingerprint salt and resets the counter to zero.
    ///
    /// # Errors
    ///
    /// - `InvalidSeed` if derivation rejects the seed; the previous pairing
    ///   stays untouched
    /// - `Storage` if the fresh record cannot be written; the session is left
    ///   unpaired
    pub fn establish(&mut self, seed: &Seed) -> Result<(), EngineError> {
        let secret = derive_secret(seed.as_bytes(), self.config.min_seed_len)?;

        self.active = None;

        let mut salt = [0u8; FINGERPRINT_SALT_LEN];
        self.env.random_bytes(&mut salt);
        let binding = SecretBinding::new(&secret, salt, self.config.secret_persistence);
        self.counters.reset(binding.clone())?;

        self.activate(secret, &binding);
        tracing::info!(
            fingerprint = %binding.fingerprint().short(),
            persistence = ?self.config.secret_persistence,
            "Entangled"
        );
        Ok(())
    }

    /// Pair with a scanned Base64 seed.
    pub fn scan(&mut self, encoded: &str) -> Result<(), EngineError> {
        let seed = Seed::from_base64(encoded)?;
        self.establish(&seed)
    }

    /// Generate a new seed, pair with it locally and return it for display.
    ///
    /// The previous secret and its counter slot are discarded first and
    /// never reused.
    pub fn regenerate(&mut self) -> Result<Seed, EngineError> {
        self.disentangle()?;

        let seed = Seed::generate(&self.env);
        self.establish(&seed)?;
        tracing::info!("Regenerated seed");
        Ok(seed)
    }

    /// Reload the secret for a dormant binding.
    ///
    /// Returns the persisted counter.
    ///
    /// # Errors
    ///
    /// - `NotEntangled` if nothing is persisted
    /// - `InvalidSeed` if derivation rejects the seed
    /// - `StateMismatch` if the seed belongs to another pairing; the record is
    ///   wiped
    /// - `CorruptState` after wiping an unreadable record
    pub fn resume(&mut self, seed: &Seed) -> Result<u64, EngineError> {
        let secret = derive_secret(seed.as_bytes(), self.config.min_seed_len)?;

        let loaded = self.counters.load();
        let record = self.guard(loaded)?.ok_or(EngineError::NotEntangled)?;

        if !record.binding.matches(&secret) {
            return self.guard(Err(EngineError::StateMismatch));
        }

        self.activate(secret, &record.binding);
        tracing::info!(
            fingerprint = %record.binding.fingerprint().short(),
            counter = record.counter,
            "Resumed with supplied seed"
        );
        Ok(record.counter)
    }

    /// Drop the active secret and delete the persisted record.
    pub fn disentangle(&mut self) -> Result<(), EngineError> {
        self.active = None;
        self.counters.clear()?;
        tracing::info!("Disentangled");
        Ok(())
    }

    /// Next `len` keystream bytes.
    ///
    /// # Errors
    ///
    /// - `NotEntangled` if no secret is active
    /// - `InvalidLength` if `len` is zero or above `max_request_len`
    /// - `CounterExhausted` once the block space is used up
    /// - `StateMismatch` or `CorruptState` after failing closed
    pub fn next_bytes(&mut self, len: usize) -> Result<Pad, EngineError> {
        let generator = self.active.as_ref().ok_or(EngineError::NotEntangled)?;
        let result = generator.next_bytes(len);
        self.guard(result)
    }

    /// XOR `data` with fresh keystream. Encrypts and decrypts.
    pub fn apply_keystream(&mut self, data: &[u8]) -> Result<Vec<u8>, EngineError> {
        let pad = self.next_bytes(data.len())?;
        Ok(apply_pad(data, &pad)?)
    }

    /// Encrypt UTF-8 text to Base64.
    pub fn encrypt(&mut self, plaintext: &str) -> Result<String, EngineError> {
        let ciphertext = self.apply_keystream(plaintext.as_bytes())?;
        Ok(BASE64.encode(ciphertext))
    }

    /// Decrypt Base64 ciphertext to text.
    ///
    /// Invalid UTF-8 (e.g. after the peers' counters diverged) is replaced
    /// rather than rejected; there is no integrity check.
    ///
    /// # Errors
    ///
    /// - `InvalidCiphertext` if the input is not Base64; no counter is used
    /// - the errors of [`Session::next_bytes`]
    pub fn decrypt(&mut self, ciphertext: &str) -> Result<String, EngineError> {
        let bytes = BASE64
            .decode(ciphertext.trim())
            .map_err(|e| EngineError::InvalidCiphertext(e.to_string()))?;
        let plaintext = self.apply_keystream(&bytes)?;
        Ok(String::from_utf8_lossy(&plaintext).into_owned())
    }

    /// Persisted counter of the active secret.
    pub fn counter(&mut self) -> Result<u64, EngineError> {
        let generator = self.active.as_ref().ok_or(EngineError::NotEntangled)?;
        let result = generator.counter();
        self.guard(result)
    }

    /// Read-only summary of the session.
    ///
    /// # Errors
    ///
    /// - `StateMismatch` if the active secret no longer owns the record
    /// - `CorruptState` or `Storage` if the record cannot be read
    pub fn diagnostics(&self) -> Result<Diagnostics, EngineError> {
        match &self.active {
            Some(generator) => Ok(Diagnostics::active(generator.counter()?, &self.config)),
            None => Ok(match self.counters.load()? {
                Some(record) => Diagnostics::dormant(record.counter),
                None => Diagnostics::unpaired(),
            }),
        }
    }

    fn activate(&mut self, secret: SharedSecret, binding: &SecretBinding) {
        self.active = Some(KeystreamGenerator::new(
            secret,
            binding.fingerprint(),
            self.counters.clone(),
            self.config.max_request_len,
        ));
    }

    /// Wipe state on mismatch or corruption, then pass the result through.
    fn guard<T>(&mut self, result: Result<T, EngineError>) -> Result<T, EngineError> {
        if let Err(err @ (EngineError::StateMismatch | EngineError::CorruptState { .. })) = &result
        {
            tracing::warn!(error = %err, "Failing closed, wiping persisted state");
            self.active = None;
            if let Err(wipe_err) = self.counters.clear() {
                tracing::error!(error = %wipe_err, "Failed to wipe persisted state");
            }
        }
        result
    }
}
