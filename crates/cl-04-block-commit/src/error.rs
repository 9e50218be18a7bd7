//! Error types for the Block Commit Coordinator

use crate::domain::ProposalStatus;
use shared_types::{ErrorCode, IdentityId};
use thiserror::Error;

/// Block commit errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// No proposal for this hash
    #[error("Block proposal not found: {block_hash}")]
    NotFound { block_hash: String },

    /// Same producer, time and payload already proposed
    #[error("Block already proposed: {block_hash}")]
    DuplicateProposal { block_hash: String },

    /// Proposal is committed or discarded
    #[error("Block {block_hash} is no longer collecting ({status:?})")]
    NotCollecting {
        block_hash: String,
        status: ProposalStatus,
    },

    /// Commit attempted with too few signatures
    #[error("Quorum not reached: collected {collected} signatures, required {required}")]
    QuorumNotReached { collected: usize, required: usize },

    /// A validator's signature could not be obtained or did not verify.
    /// Logged and excluded from the set, never fatal on its own.
    #[error("Signature from {validator} unavailable: {reason}")]
    SignatureUnavailable { validator: IdentityId, reason: String },
}

impl ErrorCode for CommitError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "block_not_found",
            Self::DuplicateProposal { .. } => "duplicate_proposal",
            Self::NotCollecting { .. } => "not_collecting",
            Self::QuorumNotReached { .. } => "quorum_not_reached",
            Self::SignatureUnavailable { .. } => "signature_unavailable",
        }
    }
}

/// Errors raised by a signature provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("No signing key for {validator}")]
    KeyUnavailable { validator: IdentityId },

    #[error("Signer for {validator} refused: {reason}")]
    Refused { validator: IdentityId, reason: String },
}

/// Result type for block commit operations
pub type CommitResult<T> = Result<T, CommitError>;
