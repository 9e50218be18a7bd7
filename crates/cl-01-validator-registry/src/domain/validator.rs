//! Validator domain entities

use serde::{Deserialize, Serialize};
use shared_types::{GeoLevel, IdentityId, Location, PublicKeyRef, Role, Timestamp};
use uuid::Uuid;

/// Validator status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorStatus {
    Active,
    Inactive,
}

/// A registered validator.
///
/// Records are never hard-deleted; deactivation flips `status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub id: Uuid,
    pub identity: IdentityId,
    pub role: Role,
    pub location: Location,
    pub status: ValidatorStatus,
    pub registered_at: Timestamp,
    pub validation_count: u64,
    pub last_validation_at: Option<Timestamp>,
    pub public_key_ref: PublicKeyRef,
    /// Reason recorded by the last deactivation
    pub deactivation_reason: Option<String>,
}

impl Validator {
    /// Create a new active validator
    pub fn new(
        identity: IdentityId,
        role: Role,
        location: Location,
        public_key_ref: PublicKeyRef,
        registered_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            role,
            location,
            status: ValidatorStatus::Active,
            registered_at,
            validation_count: 0,
            last_validation_at: None,
            public_key_ref,
            deactivation_reason: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ValidatorStatus::Active
    }

    /// Bump stats after a cast validation
    pub fn record_validation(&mut self, at: Timestamp) {
        self.validation_count += 1;
        self.last_validation_at = Some(at);
    }
}

/// Geography filter for active-validator counts.
///
/// Matches every level from the country down to `level`, so a state filter
/// never confuses two same-named states in different countries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeoFilter {
    pub level: GeoLevel,
    pub location: Location,
}

impl GeoFilter {
    pub fn new(level: GeoLevel, location: Location) -> Self {
        Self { level, location }
    }

    pub fn matches(&self, location: &Location) -> bool {
        let levels: &[GeoLevel] = match self.level {
            GeoLevel::Country => &[GeoLevel::Country],
            GeoLevel::State => &[GeoLevel::Country, GeoLevel::State],
            GeoLevel::City => &[GeoLevel::Country, GeoLevel::State, GeoLevel::City],
        };
        levels
            .iter()
            .all(|level| self.location.matches_at(location, *level))
    }
}
