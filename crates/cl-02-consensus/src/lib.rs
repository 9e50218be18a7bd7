//! # cl-02-consensus
//!
//! Consensus Calculator for Civic-Ledger: the arithmetic that turns a
//! validator-set size (and, for tiers, an approval percentage) into a
//! required count.
//!
//! ## Two Rounding Policies
//!
//! | Layer | Rule | Rounding |
//! |-------|------|----------|
//! | Tiered validation requests | `max(1, floor(received * pct / 100))` per tier | floor |
//! | PoA block signatures | `n / 2 + 1` over the proposal-time active set | strict majority |
//!
//! The policies are deliberately separate. The tiered floor tolerates a
//! minority that cannot veto; PoA commits always need a strict majority.

pub mod domain;

pub use domain::{
    evaluate_tiered, required_approvals, required_signatures, ConsensusThresholds, FinalResult,
    QuorumSnapshot, ThresholdError, TierReport, TierThreshold, TierVotes, TieredOutcome,
    DEFAULT_TIER_TIMEOUT_SECS, FINAL_APPROVAL_PERCENT,
};
