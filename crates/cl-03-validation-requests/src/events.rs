//! Published events (audit trail)
//!
//! Every accepted mutation emits one event; the stream is append-only.

use cl_02_consensus::FinalResult;
use serde::{Deserialize, Serialize};
use shared_types::{Hash, IdentityId, Tier, Timestamp, ValidationLevel};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationEvent {
    RequestCreated {
        request_id: Uuid,
        block_hash: Hash,
        requester: IdentityId,
        level: ValidationLevel,
        expires_at: Timestamp,
    },
    RecordAccepted {
        request_id: Uuid,
        validator: IdentityId,
        tier: Tier,
        approve: bool,
        at: Timestamp,
    },
    ConsensusReached {
        request_id: Uuid,
        final_result: FinalResult,
        at: Timestamp,
    },
    RequestExpired {
        request_id: Uuid,
        at: Timestamp,
    },
}

impl ValidationEvent {
    pub fn request_id(&self) -> Uuid {
        match self {
            Self::RequestCreated { request_id, .. }
            | Self::RecordAccepted { request_id, .. }
            | Self::ConsensusReached { request_id, .. }
            | Self::RequestExpired { request_id, .. } => *request_id,
        }
    }
}
