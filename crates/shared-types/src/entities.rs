//! # Core Domain Entities
//!
//! Defines the entities shared by every validation subsystem.
//!
//! ## Clusters
//!
//! - **Identity**: `IdentityId`, `Role`, key and signature references
//! - **Jurisdiction**: `Location`, `GeoLevel`
//! - **Validation**: `Tier`, `ValidationLevel`

use crate::errors::ParseEntityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CLUSTER A: PRIMITIVES
// =============================================================================

/// A 32-byte hash (Keccak-256 for block contents).
pub type Hash = [u8; 32];

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Opaque signature produced by the injected signature provider.
pub type SignatureRef = Vec<u8>;

/// Opaque public key reference; format is owned by the signature provider.
pub type PublicKeyRef = Vec<u8>;

// =============================================================================
// CLUSTER B: IDENTITY
// =============================================================================

/// Identity of a ledger participant (validator or plain member).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityId(pub String);

impl IdentityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for IdentityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Governance role hierarchy.
///
/// Variants are declared in ascending order so the derived `Ord` is the
/// authority ordering: `Member < Representative < Senator < Elder < Founder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Member,
    Representative,
    Senator,
    Elder,
    Founder,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Member,
        Role::Representative,
        Role::Senator,
        Role::Elder,
        Role::Founder,
    ];

    /// Whether this role may hold a validator seat.
    pub fn can_validate(&self) -> bool {
        !matches!(self, Role::Member)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Representative => "representative",
            Role::Senator => "senator",
            Role::Elder => "elder",
            Role::Founder => "founder",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| ParseEntityError::UnknownRole(s.to_string()))
    }
}

// =============================================================================
// CLUSTER C: JURISDICTION
// =============================================================================

/// Level in the country → state → city tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoLevel {
    Country,
    State,
    City,
}

impl fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeoLevel::Country => "country",
            GeoLevel::State => "state",
            GeoLevel::City => "city",
        };
        f.write_str(name)
    }
}

/// A (city, state, country) tuple as entered by the participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
    pub country: String,
}

impl Location {
    pub fn new(city: impl Into<String>, state: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
            country: country.into(),
        }
    }

    /// Raw name at a level.
    pub fn name_at(&self, level: GeoLevel) -> &str {
        match level {
            GeoLevel::Country => &self.country,
            GeoLevel::State => &self.state,
            GeoLevel::City => &self.city,
        }
    }

    /// Trimmed, lowercased copy used for every comparison and index key.
    pub fn normalized(&self) -> Location {
        Location {
            city: normalize_name(&self.city),
            state: normalize_name(&self.state),
            country: normalize_name(&self.country),
        }
    }

    /// Case-normalized exact match at a single level.
    pub fn matches_at(&self, other: &Location, level: GeoLevel) -> bool {
        normalize_name(self.name_at(level)) == normalize_name(other.name_at(level))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.city, self.state, self.country)
    }
}

/// Normalize a place name for comparison.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// =============================================================================
// CLUSTER D: VALIDATION
// =============================================================================

/// One category of required attestation within a validation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Founder,
    City,
    State,
    Country,
    Role,
}

impl Tier {
    /// Geographic level compared by this tier, if it is a jurisdiction tier.
    pub fn geo_level(&self) -> Option<GeoLevel> {
        match self {
            Tier::City => Some(GeoLevel::City),
            Tier::State => Some(GeoLevel::State),
            Tier::Country => Some(GeoLevel::Country),
            Tier::Founder | Tier::Role => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Founder => "founder",
            Tier::City => "city",
            Tier::State => "state",
            Tier::Country => "country",
            Tier::Role => "role",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseEntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "founder" => Ok(Tier::Founder),
            "city" => Ok(Tier::City),
            "state" => Ok(Tier::State),
            "country" => Ok(Tier::Country),
            "role" => Ok(Tier::Role),
            _ => Err(ParseEntityError::UnknownTier(s.to_string())),
        }
    }
}

/// Security level of a validation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationLevel {
    Basic,
    Standard,
    Secure,
    Maximum,
}

impl ValidationLevel {
    /// Tiers that must each reach quorum for this level.
    pub fn required_tiers(&self) -> &'static [Tier] {
        match self {
            ValidationLevel::Basic => &[Tier::City],
            ValidationLevel::Standard => &[Tier::City, Tier::State],
            ValidationLevel::Secure => &[Tier::City, Tier::State, Tier::Country],
            ValidationLevel::Maximum => &[
                Tier::Founder,
                Tier::City,
                Tier::State,
                Tier::Country,
                Tier::Role,
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::Basic => "basic",
            ValidationLevel::Standard => "standard",
            ValidationLevel::Secure => "secure",
            ValidationLevel::Maximum => "maximum",
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationLevel {
    type Err = ParseEntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(ValidationLevel::Basic),
            "standard" => Ok(ValidationLevel::Standard),
            "secure" => Ok(ValidationLevel::Secure),
            "maximum" => Ok(ValidationLevel::Maximum),
            _ => Err(ParseEntityError::UnknownLevel(s.to_string())),
        }
    }
}
