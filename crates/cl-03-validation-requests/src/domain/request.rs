//! Validation request entities
//!
//! State Machine:
//! ```text
//! [PENDING] ──consensus reached──→ [COMPLETED]
//!     │
//!     └──── now > expires_at ────→ [EXPIRED]
//! ```
//! Both terminal states are immutable.

use cl_02_consensus::{FinalResult, TierVotes};
use serde::{Deserialize, Serialize};
use shared_types::{
    Hash, IdentityId, Location, Role, SignatureRef, Tier, Timestamp, ValidationLevel,
};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Request lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Completed,
    Expired,
}

/// One validator's attestation for one tier.
///
/// INVARIANT: at most one record per (request, validator, tier).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub validator: IdentityId,
    pub tier: Tier,
    pub approve: bool,
    pub timestamp: Timestamp,
    pub signature_ref: SignatureRef,
    /// Validator location at the time of the attestation
    pub validator_location: Location,
}

/// Multi-tier validation request for a block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub id: Uuid,
    pub target_block_hash: Hash,
    pub requester: IdentityId,
    /// Requester location at creation; `None` if the requester is not indexed
    pub requester_location: Option<Location>,
    pub level: ValidationLevel,
    pub required_tiers: Vec<Tier>,
    /// Lowest role accepted on the role tier
    pub minimum_role: Role,
    pub payload: Vec<u8>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub status: RequestStatus,
    pub tiers_received: BTreeMap<Tier, Vec<ValidationRecord>>,
    pub consensus_reached: bool,
    pub final_result: Option<FinalResult>,
    pub closed_at: Option<Timestamp>,
    /// Bumped on every mutation
    pub version: u64,
}

impl ValidationRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        target_block_hash: Hash,
        requester: IdentityId,
        requester_location: Option<Location>,
        level: ValidationLevel,
        minimum_role: Role,
        payload: Vec<u8>,
        created_at: Timestamp,
        window_secs: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_block_hash,
            requester,
            requester_location,
            level,
            required_tiers: level.required_tiers().to_vec(),
            minimum_role,
            payload,
            created_at,
            expires_at: created_at.saturating_add(window_secs),
            status: RequestStatus::Pending,
            tiers_received: BTreeMap::new(),
            consensus_reached: false,
            final_result: None,
            closed_at: None,
            version: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Strictly after the deadline
    pub fn is_past_expiry(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    pub fn requires(&self, tier: Tier) -> bool {
        self.required_tiers.contains(&tier)
    }

    pub fn has_record(&self, validator: &IdentityId, tier: Tier) -> bool {
        self.tiers_received
            .get(&tier)
            .is_some_and(|records| records.iter().any(|r| &r.validator == validator))
    }

    pub fn records(&self, tier: Tier) -> &[ValidationRecord] {
        self.tiers_received
            .get(&tier)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn total_records(&self) -> usize {
        self.tiers_received.values().map(Vec::len).sum()
    }

    /// Vote counts for every required tier, in required order
    pub fn tier_votes(&self) -> Vec<TierVotes> {
        self.required_tiers
            .iter()
            .map(|tier| {
                let records = self.records(*tier);
                TierVotes {
                    tier: *tier,
                    received: records.len(),
                    approvals: records.iter().filter(|r| r.approve).count(),
                }
            })
            .collect()
    }

    /// Append a record. Caller has already run the eligibility check.
    pub fn append_record(&mut self, record: ValidationRecord) {
        self.tiers_received
            .entry(record.tier)
            .or_default()
            .push(record);
        self.version += 1;
    }

    pub fn mark_completed(&mut self, result: FinalResult, at: Timestamp) {
        self.status = RequestStatus::Completed;
        self.consensus_reached = true;
        self.final_result = Some(result);
        self.closed_at = Some(at);
        self.version += 1;
    }

    pub fn mark_expired(&mut self, at: Timestamp) {
        self.status = RequestStatus::Expired;
        self.closed_at = Some(at);
        self.version += 1;
    }
}
