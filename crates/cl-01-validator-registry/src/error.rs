//! Error types for the Validator Registry subsystem

use shared_types::{ErrorCode, IdentityId};
use thiserror::Error;

/// Validator registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Identity already holds a validator record
    #[error("Validator already registered: {identity}")]
    DuplicateValidator { identity: IdentityId },

    /// Role may not hold a validator seat
    #[error("Role is not eligible to validate: {role}")]
    IneligibleRole { role: String },

    /// No record for this identity
    #[error("Not found: {identity}")]
    NotFound { identity: IdentityId },

    /// Deactivate called on an inactive validator
    #[error("Validator already inactive: {identity}")]
    AlreadyInactive { identity: IdentityId },

    /// Reactivate called on an active validator
    #[error("Validator already active: {identity}")]
    AlreadyActive { identity: IdentityId },

    /// Location has a blank component
    #[error("Invalid location for {identity}: city, state and country are required")]
    InvalidLocation { identity: IdentityId },

    /// Validator is inactive and may not cast validations
    #[error("Validator is inactive: {identity}")]
    InactiveValidator { identity: IdentityId },

    /// Identity directory has no profile (or none is configured)
    #[error("Identity directory has no profile for {identity}")]
    DirectoryMiss { identity: IdentityId },
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::DuplicateValidator { .. } => "duplicate_validator",
            Self::IneligibleRole { .. } => "ineligible_role",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyInactive { .. } => "already_inactive",
            Self::AlreadyActive { .. } => "already_active",
            Self::InvalidLocation { .. } => "invalid_location",
            Self::InactiveValidator { .. } => "inactive_validator",
            Self::DirectoryMiss { .. } => "directory_miss",
        }
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
