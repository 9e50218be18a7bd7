//! Tiered multi-level consensus
//!
//! For every required tier:
//! 1. `received < minimum_validator_count` ⇒ not reached
//! 2. `approvals < max(1, floor(received * percent / 100))` ⇒ not reached
//!
//! When every tier passes, the request is decided: approved if at least 51% of
//! all records across tiers approve, rejected otherwise.

use super::ConsensusThresholds;
use serde::{Deserialize, Serialize};
use shared_types::Tier;

/// Overall approval share needed once every tier has quorum
pub const FINAL_APPROVAL_PERCENT: u64 = 51;

/// Outcome of a decided request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalResult {
    Approved,
    Rejected,
}

/// Vote counts for one tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierVotes {
    pub tier: Tier,
    pub received: usize,
    pub approvals: usize,
}

/// Per-tier evaluation, kept for status reporting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierReport {
    pub tier: Tier,
    pub received: usize,
    pub approvals: usize,
    pub minimum_required: usize,
    pub required_approvals: usize,
}

impl TierReport {
    pub fn meets_minimum(&self) -> bool {
        self.received >= self.minimum_required
    }

    pub fn meets_approvals(&self) -> bool {
        self.approvals >= self.required_approvals
    }
}

/// Result of a tiered consensus check
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieredOutcome {
    pub reached: bool,
    pub final_result: Option<FinalResult>,
    pub tiers: Vec<TierReport>,
}

/// `max(1, floor(received * percent / 100))`
pub fn required_approvals(received: usize, percent: u8) -> usize {
    ((received * percent as usize) / 100).max(1)
}

/// Evaluate consensus over the given tiers.
pub fn evaluate_tiered(votes: &[TierVotes], thresholds: &ConsensusThresholds) -> TieredOutcome {
    let tiers: Vec<TierReport> = votes
        .iter()
        .map(|v| {
            let threshold = thresholds.get(v.tier);
            TierReport {
                tier: v.tier,
                received: v.received,
                approvals: v.approvals,
                minimum_required: threshold.minimum_validator_count,
                required_approvals: required_approvals(
                    v.received,
                    threshold.required_approval_percent,
                ),
            }
        })
        .collect();

    let undecided = |tiers: Vec<TierReport>| TieredOutcome {
        reached: false,
        final_result: None,
        tiers,
    };

    if tiers.is_empty() || !tiers.iter().all(TierReport::meets_minimum) {
        return undecided(tiers);
    }
    if !tiers.iter().all(TierReport::meets_approvals) {
        return undecided(tiers);
    }

    let total: usize = tiers.iter().map(|t| t.received).sum();
    let approvals: usize = tiers.iter().map(|t| t.approvals).sum();
    if total == 0 {
        return undecided(tiers);
    }

    let approved = approvals as u64 * 100 >= total as u64 * FINAL_APPROVAL_PERCENT;
    TieredOutcome {
        reached: true,
        final_result: Some(if approved {
            FinalResult::Approved
        } else {
            FinalResult::Rejected
        }),
        tiers,
    }
}
