//! Eligibility Checker
//!
//! Decides whether a validator may cast a given tier of attestation on a
//! request. Runs before any record is accepted.
//!
//! Checks, in order:
//! 1. validator exists and is active
//! 2. tier is required by the request
//! 3. founder tier ⇒ role is founder
//! 4. city/state/country tier ⇒ same place as the requester at that level
//! 5. role tier ⇒ role ≥ request minimum
//! 6. no existing record for (validator, tier)

use super::ValidationRequest;
use cl_01_validator_registry::{Validator, ValidatorRegistry};
use serde::{Deserialize, Serialize};
use shared_types::{GeoLevel, IdentityId, Role, Tier};
use std::fmt;

/// Why a validator was denied
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IneligibilityReason {
    UnknownValidator,
    InactiveValidator,
    TierNotRequired { tier: Tier },
    NotFounder { role: Role },
    /// Requester or validator has no location at this level
    UnknownLocation { level: GeoLevel },
    LocationMismatch { level: GeoLevel },
    RoleBelowMinimum { role: Role, minimum: Role },
    AlreadyValidated { tier: Tier },
}

impl fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownValidator => write!(f, "validator is not registered"),
            Self::InactiveValidator => write!(f, "validator is inactive"),
            Self::TierNotRequired { tier } => {
                write!(f, "tier {} is not required by this request", tier)
            }
            Self::NotFounder { role } => write!(f, "founder tier requires founder role, got {}", role),
            Self::UnknownLocation { level } => write!(f, "{} location unknown", level),
            Self::LocationMismatch { level } => {
                write!(f, "validator {} does not match requester {}", level, level)
            }
            Self::RoleBelowMinimum { role, minimum } => {
                write!(f, "role {} is below required {}", role, minimum)
            }
            Self::AlreadyValidated { tier } => {
                write!(f, "validator already submitted a {} validation", tier)
            }
        }
    }
}

/// Result of an eligibility check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EligibilityDecision {
    pub eligible: bool,
    pub reason: Option<IneligibilityReason>,
}

impl EligibilityDecision {
    fn allow() -> Self {
        Self {
            eligible: true,
            reason: None,
        }
    }

    fn deny(reason: IneligibilityReason) -> Self {
        Self {
            eligible: false,
            reason: Some(reason),
        }
    }
}

/// Pure eligibility rule over an already-resolved candidate.
pub fn evaluate_eligibility(
    request: &ValidationRequest,
    candidate: Option<&Validator>,
    tier: Tier,
) -> EligibilityDecision {
    let Some(validator) = candidate else {
        return EligibilityDecision::deny(IneligibilityReason::UnknownValidator);
    };
    if !validator.is_active() {
        return EligibilityDecision::deny(IneligibilityReason::InactiveValidator);
    }
    if !request.requires(tier) {
        return EligibilityDecision::deny(IneligibilityReason::TierNotRequired { tier });
    }

    match tier {
        Tier::Founder => {
            if validator.role != Role::Founder {
                return EligibilityDecision::deny(IneligibilityReason::NotFounder {
                    role: validator.role,
                });
            }
        }
        Tier::City | Tier::State | Tier::Country => {
            if let Some(reason) = jurisdiction_mismatch(request, validator, tier) {
                return EligibilityDecision::deny(reason);
            }
        }
        Tier::Role => {
            if validator.role < request.minimum_role {
                return EligibilityDecision::deny(IneligibilityReason::RoleBelowMinimum {
                    role: validator.role,
                    minimum: request.minimum_role,
                });
            }
        }
    }

    if request.has_record(&validator.identity, tier) {
        return EligibilityDecision::deny(IneligibilityReason::AlreadyValidated { tier });
    }

    EligibilityDecision::allow()
}

fn jurisdiction_mismatch(
    request: &ValidationRequest,
    validator: &Validator,
    tier: Tier,
) -> Option<IneligibilityReason> {
    let level = tier.geo_level()?;
    let requester = match &request.requester_location {
        Some(location) if !location.name_at(level).trim().is_empty() => location,
        _ => return Some(IneligibilityReason::UnknownLocation { level }),
    };
    if validator.location.name_at(level).trim().is_empty() {
        return Some(IneligibilityReason::UnknownLocation { level });
    }
    if !requester.matches_at(&validator.location, level) {
        return Some(IneligibilityReason::LocationMismatch { level });
    }
    None
}

/// Registry-backed checker
pub struct EligibilityChecker<'a> {
    registry: &'a ValidatorRegistry,
}

impl<'a> EligibilityChecker<'a> {
    pub fn new(registry: &'a ValidatorRegistry) -> Self {
        Self { registry }
    }

    /// Resolve the candidate and evaluate. Returns the resolved validator too.
    pub fn check(
        &self,
        request: &ValidationRequest,
        candidate: &IdentityId,
        tier: Tier,
    ) -> (EligibilityDecision, Option<Validator>) {
        let validator = self.registry.lookup(candidate).ok();
        let decision = evaluate_eligibility(request, validator.as_ref(), tier);
        (decision, validator)
    }
}
