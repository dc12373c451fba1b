//! Runtime configuration for the scheduler and player actions.
use bluetank_game::CooldownPolicy;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// How a read-modify-write cycle on one tank is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyMode {
    /// Serialize writers per tank with an in-process lock.
    #[default]
    Lock,
    /// Commit against the version read and retry on conflict.
    Optimistic,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
    #[error("min_tick_elapsed_secs {min_elapsed} exceeds tick_interval_secs {interval}")]
    ElapsedExceedsInterval { min_elapsed: u64, interval: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Tanks ticked more recently than this are skipped.
    #[serde(default = "ServerConfig::default_min_tick_elapsed_secs")]
    pub min_tick_elapsed_secs: u64,
    #[serde(default)]
    pub consistency: ConsistencyMode,
    #[serde(default = "ServerConfig::default_max_commit_retries")]
    pub max_commit_retries: u32,
    #[serde(default = "ServerConfig::default_spam_ttl_secs")]
    pub spam_ttl_secs: u64,
    #[serde(default = "ServerConfig::default_spam_max_actors")]
    pub spam_max_actors: usize,
    #[serde(default)]
    pub feed_cooldown: CooldownPolicy,
    /// Coins granted with an owner's first tank.
    #[serde(default = "ServerConfig::default_starting_coins")]
    pub starting_coins: u32,
    /// Fixed seed for the threat streams; drawn from entropy when absent.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl ServerConfig {
    #[must_use]
    pub const fn default_tick_interval_secs() -> u64 {
        60
    }

    #[must_use]
    pub const fn default_min_tick_elapsed_secs() -> u64 {
        30
    }

    #[must_use]
    pub const fn default_max_commit_retries() -> u32 {
        5
    }

    #[must_use]
    pub const fn default_spam_ttl_secs() -> u64 {
        300
    }

    #[must_use]
    pub const fn default_spam_max_actors() -> usize {
        10_000
    }

    #[must_use]
    pub const fn default_starting_coins() -> u32 {
        100
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed JSON or out-of-range values.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates its documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::at_least("tick_interval_secs", 1, self.tick_interval_secs)?;
        Self::at_least("max_commit_retries", 1, u64::from(self.max_commit_retries))?;
        Self::at_least("spam_ttl_secs", 1, self.spam_ttl_secs)?;
        Self::at_least(
            "spam_max_actors",
            1,
            u64::try_from(self.spam_max_actors).unwrap_or(u64::MAX),
        )?;
        if self.min_tick_elapsed_secs > self.tick_interval_secs {
            return Err(ConfigError::ElapsedExceedsInterval {
                min_elapsed: self.min_tick_elapsed_secs,
                interval: self.tick_interval_secs,
            });
        }
        Ok(())
    }

    fn at_least(field: &'static str, min: u64, value: u64) -> Result<(), ConfigError> {
        if value < min {
            return Err(ConfigError::MinViolation { field, min, value });
        }
        Ok(())
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    #[must_use]
    pub fn min_tick_elapsed(&self) -> TimeDelta {
        TimeDelta::seconds(i64::try_from(self.min_tick_elapsed_secs).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn spam_ttl(&self) -> TimeDelta {
        TimeDelta::seconds(i64::try_from(self.spam_ttl_secs).unwrap_or(i64::MAX))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: Self::default_tick_interval_secs(),
            min_tick_elapsed_secs: Self::default_min_tick_elapsed_secs(),
            consistency: ConsistencyMode::default(),
            max_commit_retries: Self::default_max_commit_retries(),
            spam_ttl_secs: Self::default_spam_ttl_secs(),
            spam_max_actors: Self::default_spam_max_actors(),
            feed_cooldown: CooldownPolicy::default(),
            starting_coins: Self::default_starting_coins(),
            rng_seed: None,
        }
    }
}
