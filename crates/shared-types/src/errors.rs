//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors raised when parsing entity names received from outer layers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseEntityError {
    /// Role string is not part of the governance hierarchy.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Validation level string is not recognized.
    #[error("Unknown validation level: {0}")]
    UnknownLevel(String),

    /// Tier string is not recognized.
    #[error("Unknown tier: {0}")]
    UnknownTier(String),
}

/// Stable, machine-readable error code carried in failed API responses.
///
/// Codes are `snake_case` and never change once published; callers branch on
/// them instead of parsing display strings.
pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

impl ErrorCode for ParseEntityError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownRole(_) => "unknown_role",
            Self::UnknownLevel(_) => "unknown_level",
            Self::UnknownTier(_) => "unknown_tier",
        }
    }
}
