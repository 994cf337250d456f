//! Read-only session summary.
//!
//! Never carries the secret, the seed or keystream bytes.

use entangle_crypto::COUNTER_SPACE;

use crate::config::EngineConfig;

/// Coarse session health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// Nothing is persisted
    Unpaired,
    /// A binding is persisted but its secret is not loaded
    Dormant,
    /// Plenty of counter space left
    Healthy,
    /// Fewer than `low_budget` blocks left
    Low,
    /// Fewer than `critical_budget` blocks left
    Critical,
    /// No blocks left; re-pair
    Exhausted,
}

impl Health {
    /// Health of an active session with `remaining` blocks.
    pub fn assess(remaining: u64, config: &EngineConfig) -> Self {
        if remaining == 0 {
            Self::Exhausted
        } else if remaining < config.critical_budget {
            Self::Critical
        } else if remaining < config.low_budget {
            Self::Low
        } else {
            Self::Healthy
        }
    }
}

/// Snapshot returned by [`crate::Session::diagnostics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    /// Secret is loaded and keystream can be produced
    pub entangled: bool,
    /// Persisted counter, if a binding exists
    pub counter: Option<u64>,
    /// Blocks left before exhaustion
    pub remaining: u64,
    /// Coarse health
    pub health: Health,
}

impl Diagnostics {
    /// No binding persisted.
    pub fn unpaired() -> Self {
        Self { entangled: false, counter: None, remaining: 0, health: Health::Unpaired }
    }

    /// Binding persisted at `counter` but secret not loaded.
    pub fn dormant(counter: u64) -> Self {
        Self {
            entangled: false,
            counter: Some(counter),
            remaining: remaining(counter),
            health: Health::Dormant,
        }
    }

    /// Active session at `counter`.
    pub fn active(counter: u64, config: &EngineConfig) -> Self {
        let remaining = remaining(counter);
        Self {
            entangled: true,
            counter: Some(counter),
            remaining,
            health: Health::assess(remaining, config),
        }
    }
}

fn remaining(counter: u64) -> u64 {
    COUNTER_SPACE.saturating_sub(counter)
}
