//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! All values have defaults; the binary overrides them from `CL_*`
//! environment variables through [`NodeConfig::apply_overrides`].

use cl_03_validation_requests::ValidationConfig;
use cl_04_block_commit::CommitConfig;
use shared_types::Role;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn, Level};

pub const ENV_SNAPSHOT_PATH: &str = "CL_SNAPSHOT_PATH";
pub const ENV_CHECKPOINT_ON_WRITE: &str = "CL_CHECKPOINT_ON_WRITE";
pub const ENV_SIGNATURE_TIMEOUT_MS: &str = "CL_SIGNATURE_TIMEOUT_MS";
pub const ENV_COLLECTION_BUDGET_MS: &str = "CL_COLLECTION_BUDGET_MS";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "CL_SWEEP_INTERVAL_SECS";
pub const ENV_ROLE_TIER_MINIMUM: &str = "CL_ROLE_TIER_MINIMUM";
pub const ENV_LOG_LEVEL: &str = "CL_LOG_LEVEL";

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Validation engine configuration (thresholds, role tier minimum).
    pub validation: ValidationConfig,
    /// Signature collection timeouts.
    pub commit: CommitConfig,
    /// Snapshot persistence.
    pub persistence: PersistenceConfig,
    /// Interval of the background expiry sweep. `0` disables it.
    pub sweep_interval_secs: u64,
    pub log_level: Level,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            validation: ValidationConfig::default(),
            commit: CommitConfig::default(),
            persistence: PersistenceConfig::default(),
            sweep_interval_secs: 60,
            log_level: Level::INFO,
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Snapshot file. `None` keeps state in memory only.
    pub snapshot_path: Option<PathBuf>,
    /// Checkpoint after every successful mutation.
    pub checkpoint_on_write: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            checkpoint_on_write: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Collection budget ({budget_ms} ms) is shorter than the signature timeout ({timeout_ms} ms)")]
    BudgetBelowTimeout { budget_ms: u64, timeout_ms: u64 },

    #[error("Invalid consensus thresholds: {0}")]
    Thresholds(#[from] cl_02_consensus::ThresholdError),
}

impl NodeConfig {
    /// Override fields from `lookup` (normally `std::env::var`).
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_SNAPSHOT_PATH) {
            if path.trim().is_empty() {
                self.persistence.snapshot_path = None;
            } else {
                info!("Snapshot path from environment: {}", path);
                self.persistence.snapshot_path = Some(PathBuf::from(path));
            }
        }
        if let Some(enabled) = parse_var(&lookup, ENV_CHECKPOINT_ON_WRITE) {
            self.persistence.checkpoint_on_write = enabled;
        }
        if let Some(ms) = parse_var(&lookup, ENV_SIGNATURE_TIMEOUT_MS) {
            self.commit.signature_timeout_ms = ms;
        }
        if let Some(ms) = parse_var(&lookup, ENV_COLLECTION_BUDGET_MS) {
            self.commit.collection_budget_ms = ms;
        }
        if let Some(secs) = parse_var(&lookup, ENV_SWEEP_INTERVAL_SECS) {
            self.sweep_interval_secs = secs;
        }
        if let Some(role) = parse_var::<Role, _>(&lookup, ENV_ROLE_TIER_MINIMUM) {
            self.validation.role_tier_minimum = role;
        }
        if let Some(level) = parse_var(&lookup, ENV_LOG_LEVEL) {
            self.log_level = level;
        }
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validation.thresholds.validate()?;
        if self.commit.collection_budget_ms < self.commit.signature_timeout_ms {
            return Err(ConfigError::BudgetBelowTimeout {
                budget_ms: self.commit.collection_budget_ms,
                timeout_ms: self.commit.signature_timeout_ms,
            });
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(config.validation.role_tier_minimum, Role::Senator);
        assert_eq!(config.persistence.snapshot_path, None);
        assert!(config.persistence.checkpoint_on_write);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = NodeConfig::default();
        config.apply_overrides(lookup_from(&[
            (ENV_SNAPSHOT_PATH, "/var/lib/civic/state.bin"),
            (ENV_CHECKPOINT_ON_WRITE, "false"),
            (ENV_SIGNATURE_TIMEOUT_MS, "500"),
            (ENV_COLLECTION_BUDGET_MS, "4000"),
            (ENV_SWEEP_INTERVAL_SECS, "15"),
            (ENV_ROLE_TIER_MINIMUM, "elder"),
            (ENV_LOG_LEVEL, "debug"),
        ]));

        assert_eq!(
            config.persistence.snapshot_path,
            Some(PathBuf::from("/var/lib/civic/state.bin"))
        );
        assert!(!config.persistence.checkpoint_on_write);
        assert_eq!(config.commit.signature_timeout_ms, 500);
        assert_eq!(config.commit.collection_budget_ms, 4_000);
        assert_eq!(config.sweep_interval_secs, 15);
        assert_eq!(config.validation.role_tier_minimum, Role::Elder);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let mut config = NodeConfig::default();
        config.apply_overrides(lookup_from(&[
            (ENV_SIGNATURE_TIMEOUT_MS, "soon"),
            (ENV_ROLE_TIER_MINIMUM, "emperor"),
            (ENV_CHECKPOINT_ON_WRITE, "sometimes"),
        ]));
        assert!(config.persistence.checkpoint_on_write);
        assert_eq!(config.commit, CommitConfig::default());
        assert_eq!(config.validation.role_tier_minimum, Role::Senator);
    }

    #[test]
    fn test_budget_must_cover_timeout() {
        let mut config = NodeConfig::default();
        config.commit.collection_budget_ms = 100;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BudgetBelowTimeout { .. })
        ));
    }
}
