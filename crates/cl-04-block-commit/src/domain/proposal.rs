//! Block proposals and their signature sets
//!
//! State Machine:
//! ```text
//! [COLLECTING] ──commit (signatures >= required)──→ [COMMITTED]
//!       │
//!       └──────────────── discard ────────────────→ [DISCARDED]
//! ```

use cl_02_consensus::QuorumSnapshot;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use shared_types::{Hash, IdentityId, SignatureRef, Timestamp};

/// Proposal lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Collecting,
    Committed,
    Discarded,
}

/// One registry validator's signature over a block hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSignature {
    pub validator: IdentityId,
    pub timestamp: Timestamp,
    pub signature_ref: SignatureRef,
}

/// Keccak-256 over producer, proposal time and payload
pub fn compute_block_hash(producer: &IdentityId, proposed_at: Timestamp, payload: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(producer.as_str().as_bytes());
    hasher.update(proposed_at.to_le_bytes());
    hasher.update(payload);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// A produced block awaiting PoA signatures
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockProposal {
    pub block_hash: Hash,
    pub producer: IdentityId,
    pub payload: Vec<u8>,
    pub proposed_at: Timestamp,
    /// Frozen at proposal time
    pub quorum: QuorumSnapshot,
    pub signatures: Vec<ValidatorSignature>,
    pub status: ProposalStatus,
    pub committed_at: Option<Timestamp>,
}

impl BlockProposal {
    pub fn new(
        producer: IdentityId,
        payload: Vec<u8>,
        proposed_at: Timestamp,
        active_validators: usize,
    ) -> Self {
        Self {
            block_hash: compute_block_hash(&producer, proposed_at, &payload),
            producer,
            payload,
            proposed_at,
            quorum: QuorumSnapshot::new(active_validators),
            signatures: Vec::new(),
            status: ProposalStatus::Collecting,
            committed_at: None,
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.status == ProposalStatus::Collecting
    }

    pub fn has_signed(&self, validator: &IdentityId) -> bool {
        self.signatures.iter().any(|s| &s.validator == validator)
    }

    /// Add a signature unless this validator already signed. Returns whether it was added.
    pub fn add_signature(&mut self, signature: ValidatorSignature) -> bool {
        if self.has_signed(&signature.validator) {
            return false;
        }
        self.signatures.push(signature);
        true
    }

    pub fn quorum_reached(&self) -> bool {
        self.quorum.is_reached(self.signatures.len())
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.block_hash)
    }
}

/// Outcome of one collection round
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionReport {
    pub block_hash: Hash,
    /// Validators asked in this round
    pub requested: usize,
    /// Valid signatures added in this round
    pub newly_collected: usize,
    /// Total valid signatures held by the proposal
    pub collected: usize,
    pub required: usize,
    pub quorum_reached: bool,
    /// Validators whose signature timed out, failed or did not verify
    pub unavailable: Vec<(IdentityId, String)>,
    /// Stopped by the overall collection budget
    pub budget_exhausted: bool,
    /// Stopped by a shutdown signal
    pub cancelled: bool,
}
