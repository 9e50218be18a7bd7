//! Error types for the Validation Request Engine

use crate::domain::{IneligibilityReason, RequestStatus};
use cl_01_validator_registry::RegistryError;
use cl_02_consensus::ThresholdError;
use shared_types::{ErrorCode, IdentityId, Tier, Timestamp};
use thiserror::Error;
use uuid::Uuid;

/// Validation request errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No request with this id
    #[error("Validation request not found: {request_id}")]
    NotFound { request_id: Uuid },

    /// Level string is not basic/standard/secure/maximum
    #[error("Invalid validation level: {level}")]
    InvalidLevel { level: String },

    /// Request is already terminal
    #[error("Validation request {request_id} is closed ({status:?})")]
    RequestClosed {
        request_id: Uuid,
        status: RequestStatus,
    },

    /// Request passed its deadline on this access
    #[error("Validation request {request_id} expired at {expires_at}")]
    RequestExpired {
        request_id: Uuid,
        expires_at: Timestamp,
    },

    /// Eligibility check denied the submission
    #[error("Validator {validator} not eligible for {tier} tier: {reason}")]
    NotEligible {
        validator: IdentityId,
        tier: Tier,
        reason: IneligibilityReason,
    },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(#[from] ThresholdError),
}

impl ErrorCode for ValidationError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "request_not_found",
            Self::InvalidLevel { .. } => "invalid_level",
            Self::RequestClosed { .. } => "request_closed",
            Self::RequestExpired { .. } => "request_expired",
            Self::NotEligible { .. } => "not_eligible",
            Self::Registry(e) => e.code(),
            Self::InvalidThresholds(e) => e.code(),
        }
    }
}

/// Result type for validation request operations
pub type ValidationResult<T> = Result<T, ValidationError>;
