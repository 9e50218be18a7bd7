//! Consensus threshold configuration
//!
//! Static table read once at request creation.

use serde::{Deserialize, Serialize};
use shared_types::{ErrorCode, Tier};
use thiserror::Error;

/// 48 hours
pub const DEFAULT_TIER_TIMEOUT_SECS: u64 = 48 * 60 * 60;

/// Threshold for a single tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThreshold {
    /// Records required before approvals are even counted
    pub minimum_validator_count: usize,
    /// Approval percentage applied to the records received
    pub required_approval_percent: u8,
    /// Voting window contributed by this tier
    pub timeout_secs: u64,
}

impl TierThreshold {
    pub const fn new(minimum_validator_count: usize, required_approval_percent: u8) -> Self {
        Self {
            minimum_validator_count,
            required_approval_percent,
            timeout_secs: DEFAULT_TIER_TIMEOUT_SECS,
        }
    }

    pub const fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Threshold configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdError {
    #[error("Approval percent for tier {tier} out of range: {percent} > 100")]
    PercentOutOfRange { tier: Tier, percent: u8 },

    #[error("Timeout for tier {tier} must be non-zero")]
    ZeroTimeout { tier: Tier },
}

impl ErrorCode for ThresholdError {
    fn code(&self) -> &'static str {
        match self {
            Self::PercentOutOfRange { .. } => "threshold_percent_out_of_range",
            Self::ZeroTimeout { .. } => "threshold_zero_timeout",
        }
    }
}

/// Per-tier threshold table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusThresholds {
    pub founder: TierThreshold,
    pub city: TierThreshold,
    pub state: TierThreshold,
    pub country: TierThreshold,
    pub role: TierThreshold,
}

impl Default for ConsensusThresholds {
    fn default() -> Self {
        Self {
            founder: TierThreshold::new(1, 10),
            city: TierThreshold::new(3, 51),
            state: TierThreshold::new(2, 51),
            country: TierThreshold::new(2, 51),
            role: TierThreshold::new(2, 51),
        }
    }
}

impl ConsensusThresholds {
    pub fn get(&self, tier: Tier) -> &TierThreshold {
        match tier {
            Tier::Founder => &self.founder,
            Tier::City => &self.city,
            Tier::State => &self.state,
            Tier::Country => &self.country,
            Tier::Role => &self.role,
        }
    }

    /// Replace one tier's threshold
    pub fn with_tier(mut self, tier: Tier, threshold: TierThreshold) -> Self {
        let slot = match tier {
            Tier::Founder => &mut self.founder,
            Tier::City => &mut self.city,
            Tier::State => &mut self.state,
            Tier::Country => &mut self.country,
            Tier::Role => &mut self.role,
        };
        *slot = threshold;
        self
    }

    /// Voting window for a request: the longest timeout among its tiers.
    pub fn window_for(&self, tiers: &[Tier]) -> u64 {
        tiers
            .iter()
            .map(|tier| self.get(*tier).timeout_secs)
            .max()
            .unwrap_or(DEFAULT_TIER_TIMEOUT_SECS)
    }

    pub fn validate(&self) -> Result<(), ThresholdError> {
        for tier in [Tier::Founder, Tier::City, Tier::State, Tier::Country, Tier::Role] {
            let threshold = self.get(tier);
            if threshold.required_approval_percent > 100 {
                return Err(ThresholdError::PercentOutOfRange {
                    tier,
                    percent: threshold.required_approval_percent,
                });
            }
            if threshold.timeout_secs == 0 {
                return Err(ThresholdError::ZeroTimeout { tier });
            }
        }
        Ok(())
    }
}
