//! Engine configuration.

use entangle_crypto::{BLOCK_LEN, DEFAULT_MIN_SEED_LEN};
use thiserror::Error;

use crate::seed::SEED_LEN;

/// Default storage identifier for the persisted record.
pub const DEFAULT_STATE_KEY: &str = "entangled_state";

/// Default upper bound for a single keystream request.
pub const DEFAULT_MAX_REQUEST_LEN: usize = 1024;

/// Whether the derived secret itself is written to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretPersistence {
    /// Persist only a salted fingerprint. After a restart the session stays
    /// dormant until the seed is supplied again.
    #[default]
    FingerprintOnly,

    /// Persist the full secret so a restart resumes automatically.
    ///
    /// Anyone who can read the state file can decrypt every message of the
    /// pairing.
    Secret,
}

/// Configuration rejected by [`EngineConfig::validate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `min_seed_len` is zero
    #[error("min_seed_len must be at least 1")]
    ZeroMinSeedLen,

    /// `min_seed_len` is longer than any seed
    #[error("min_seed_len ({min}) exceeds the seed length ({seed_len})")]
    MinSeedLenAboveSeed {
        /// Configured minimum
        min: usize,
        /// Length of every seed
        seed_len: usize,
    },

    /// `max_request_len` is zero
    #[error("max_request_len must be at least 1")]
    ZeroMaxRequestLen,

    /// `state_key` is empty
    #[error("state_key must not be empty")]
    EmptyStateKey,

    /// Critical threshold is above the low threshold
    #[error("critical_budget ({critical}) must not exceed low_budget ({low})")]
    InvertedBudgets {
        /// Low-budget threshold
        low: u64,
        /// Critical-budget threshold
        critical: u64,
    },
}

/// Tunables for a [`crate::Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Shortest seed accepted by secret derivation.
    pub min_seed_len: usize,
    /// Largest keystream request (and therefore message) in bytes.
    pub max_request_len: usize,
    /// Secret-at-rest policy.
    pub secret_persistence: SecretPersistence,
    /// Storage identifier for the persisted record.
    pub state_key: String,
    /// Remaining blocks below which health reports `Low`.
    pub low_budget: u64,
    /// Remaining blocks below which health reports `Critical`.
    pub critical_budget: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_seed_len: DEFAULT_MIN_SEED_LEN,
            max_request_len: DEFAULT_MAX_REQUEST_LEN,
            secret_persistence: SecretPersistence::default(),
            state_key: DEFAULT_STATE_KEY.to_owned(),
            low_budget: 1 << 20,
            critical_budget: 1 << 12,
        }
    }
}

impl EngineConfig {
    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_seed_len == 0 {
            return Err(ConfigError::ZeroMinSeedLen);
        }
        if self.min_seed_len > SEED_LEN {
            return Err(ConfigError::MinSeedLenAboveSeed {
                min: self.min_seed_len,
                seed_len: SEED_LEN,
            });
        }
        if self.max_request_len == 0 {
            return Err(ConfigError::ZeroMaxRequestLen);
        }
        if self.state_key.is_empty() {
            return Err(ConfigError::EmptyStateKey);
        }
        if self.critical_budget > self.low_budget {
            return Err(ConfigError::InvertedBudgets {
                low: self.low_budget,
                critical: self.critical_budget,
            });
        }
        Ok(())
    }

    /// Blocks consumed by the largest allowed request.
    pub fn max_blocks_per_request(&self) -> usize {
        self.max_request_len.div_ceil(BLOCK_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_seed_len, 16);
        assert_eq!(config.max_request_len, 1024);
        assert_eq!(config.max_blocks_per_request(), 32);
        assert_eq!(config.secret_persistence, SecretPersistence::FingerprintOnly);
    }

    #[test]
    fn rejects_empty_state_key() {
        let config = EngineConfig { state_key: String::new(), ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::EmptyStateKey));
    }

    #[test]
    fn rejects_zero_bounds() {
        let config = EngineConfig { min_seed_len: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMinSeedLen));

        let config = EngineConfig { max_request_len: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxRequestLen));
    }

    #[test]
    fn rejects_min_seed_len_above_seed() {
        let config = EngineConfig { min_seed_len: SEED_LEN, ..Default::default() };
        assert!(config.validate().is_ok());

        let config = EngineConfig { min_seed_len: SEED_LEN + 1, ..Default::default() };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MinSeedLenAboveSeed { min: 33, seed_len: 32 })
        );
    }

    #[test]
    fn rejects_inverted_budgets() {
        let config = EngineConfig { low_budget: 10, critical_budget: 20, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::InvertedBudgets { low: 10, critical: 20 }));
    }
}
