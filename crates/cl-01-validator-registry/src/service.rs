//! Validator Registry Service - Core business logic
//!
//! # Concurrency
//! Validators and the geographic index share one `RwLock`: eligibility checks
//! read concurrently, register/deactivate/reactivate/upsert serialize.

use crate::domain::{GeoFilter, GeographicIndex, UpsertOutcome, Validator, ValidatorStatus};
use crate::error::{RegistryError, RegistryResult};
use crate::ports::IdentityDirectory;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{GeoLevel, IdentityId, Location, PublicKeyRef, Role, TimeSource, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serializable registry contents
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub validators: Vec<Validator>,
    /// Every geographic member, validators included
    pub members: Vec<(IdentityId, Location)>,
}

#[derive(Default)]
struct RegistryState {
    validators: HashMap<IdentityId, Validator>,
    geography: GeographicIndex,
}

/// Validator Registry
pub struct ValidatorRegistry {
    state: RwLock<RegistryState>,
    time_source: Arc<dyn TimeSource>,
    directory: Option<Arc<dyn IdentityDirectory>>,
}

impl ValidatorRegistry {
    /// Create an empty registry
    pub fn new(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            time_source,
            directory: None,
        }
    }

    /// Attach the identity directory used by `register_from_directory`
    pub fn with_directory(mut self, directory: Arc<dyn IdentityDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    fn ensure_location(identity: &IdentityId, location: &Location) -> RegistryResult<()> {
        let blank = [GeoLevel::City, GeoLevel::State, GeoLevel::Country]
            .iter()
            .any(|level| location.name_at(*level).trim().is_empty());
        if blank {
            return Err(RegistryError::InvalidLocation {
                identity: identity.clone(),
            });
        }
        Ok(())
    }

    // === WRITERS ===

    /// Register a validator and index its location.
    pub fn register(
        &self,
        identity: IdentityId,
        role: Role,
        location: Location,
        public_key_ref: PublicKeyRef,
    ) -> RegistryResult<Validator> {
        if !role.can_validate() {
            warn!("[cl-01] Rejecting {} with ineligible role {}", identity, role);
            return Err(RegistryError::IneligibleRole {
                role: role.to_string(),
            });
        }
        Self::ensure_location(&identity, &location)?;

        let mut state = self.state.write();
        if state.validators.contains_key(&identity) {
            return Err(RegistryError::DuplicateValidator { identity });
        }

        let validator = Validator::new(
            identity.clone(),
            role,
            location.clone(),
            public_key_ref,
            self.time_source.now(),
        );
        state.geography.upsert_member(&location, &identity);
        state.validators.insert(identity.clone(), validator.clone());

        info!(
            "[cl-01] Registered validator {} as {} in {}",
            identity, role, location
        );
        Ok(validator)
    }

    /// Register using role and location from the identity directory.
    pub fn register_from_directory(
        &self,
        identity: IdentityId,
        public_key_ref: PublicKeyRef,
    ) -> RegistryResult<Validator> {
        let profile = self
            .directory
            .as_ref()
            .and_then(|directory| directory.lookup(&identity))
            .ok_or_else(|| RegistryError::DirectoryMiss {
                identity: identity.clone(),
            })?;
        self.register(identity, profile.role, profile.location, public_key_ref)
    }

    /// Record a plain member in the geographic index.
    pub fn enroll_member(&self, identity: IdentityId, location: Location) -> RegistryResult<UpsertOutcome> {
        Self::ensure_location(&identity, &location)?;
        let mut state = self.state.write();

        // A validator's location follows its member location
        if let Some(validator) = state.validators.get_mut(&identity) {
            validator.location = location.clone();
        }
        let outcome = state.geography.upsert_member(&location, &identity);
        debug!("[cl-01] Member {} upserted: {:?}", identity, outcome);
        Ok(outcome)
    }

    /// Deactivate a validator. Not idempotent: repeats fail `AlreadyInactive`.
    pub fn deactivate(&self, identity: &IdentityId, reason: &str) -> RegistryResult<Validator> {
        let mut state = self.state.write();
        let validator = state
            .validators
            .get_mut(identity)
            .ok_or_else(|| RegistryError::NotFound {
                identity: identity.clone(),
            })?;

        if !validator.is_active() {
            return Err(RegistryError::AlreadyInactive {
                identity: identity.clone(),
            });
        }

        validator.status = ValidatorStatus::Inactive;
        validator.deactivation_reason = Some(reason.to_string());
        info!("[cl-01] Deactivated validator {}: {}", identity, reason);
        Ok(validator.clone())
    }

    /// Reactivate a validator. Not idempotent: repeats fail `AlreadyActive`.
    pub fn reactivate(&self, identity: &IdentityId) -> RegistryResult<Validator> {
        let mut state = self.state.write();
        let validator = state
            .validators
            .get_mut(identity)
            .ok_or_else(|| RegistryError::NotFound {
                identity: identity.clone(),
            })?;

        if validator.is_active() {
            return Err(RegistryError::AlreadyActive {
                identity: identity.clone(),
            });
        }

        validator.status = ValidatorStatus::Active;
        validator.deactivation_reason = None;
        info!("[cl-01] Reactivated validator {}", identity);
        Ok(validator.clone())
    }

    /// Replace a validator's public key. Signatures are verified against the
    /// registered key, so this is how a validator whose key was lost rejoins
    /// PoA collection.
    pub fn rotate_key(
        &self,
        identity: &IdentityId,
        public_key_ref: PublicKeyRef,
    ) -> RegistryResult<Validator> {
        let mut state = self.state.write();
        let validator = state
            .validators
            .get_mut(identity)
            .ok_or_else(|| RegistryError::NotFound {
                identity: identity.clone(),
            })?;
        validator.public_key_ref = public_key_ref;
        info!("[cl-01] Rotated public key of validator {}", identity);
        Ok(validator.clone())
    }

    /// Bump validation stats for a validation about to be recorded.
    /// Fails for unknown or inactive validators and leaves stats untouched.
    pub fn record_validation(&self, identity: &IdentityId, at: Timestamp) -> RegistryResult<()> {
        let mut state = self.state.write();
        let validator = state
            .validators
            .get_mut(identity)
            .ok_or_else(|| RegistryError::NotFound {
                identity: identity.clone(),
            })?;
        if !validator.is_active() {
            return Err(RegistryError::InactiveValidator {
                identity: identity.clone(),
            });
        }
        validator.record_validation(at);
        Ok(())
    }

    // === READERS ===

    pub fn lookup(&self, identity: &IdentityId) -> RegistryResult<Validator> {
        self.state
            .read()
            .validators
            .get(identity)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                identity: identity.clone(),
            })
    }

    /// Count active validators with role ≥ `min_role` inside `geography`.
    pub fn active_count(&self, min_role: Option<Role>, geography: Option<&GeoFilter>) -> usize {
        self.state
            .read()
            .validators
            .values()
            .filter(|v| v.is_active())
            .filter(|v| min_role.map_or(true, |min| v.role >= min))
            .filter(|v| geography.map_or(true, |filter| filter.matches(&v.location)))
            .count()
    }

    /// Active validators, ordered by identity
    pub fn active_validators(&self) -> Vec<Validator> {
        let mut active: Vec<Validator> = self
            .state
            .read()
            .validators
            .values()
            .filter(|v| v.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.identity.cmp(&b.identity));
        active
    }

    pub fn get_location(&self, identity: &IdentityId) -> RegistryResult<Location> {
        self.state
            .read()
            .geography
            .get_location(identity)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                identity: identity.clone(),
            })
    }

    pub fn get_member_count(&self, level: GeoLevel, name: &str) -> usize {
        self.state.read().geography.get_member_count(level, name)
    }

    /// Member count of the node addressed by the full path of `location`
    pub fn member_count_at(&self, level: GeoLevel, location: &Location) -> usize {
        self.state
            .read()
            .geography
            .node(level, location)
            .map_or(0, |node| node.total_member_count())
    }

    pub fn validator_count(&self) -> usize {
        self.state.read().validators.len()
    }

    // === PERSISTENCE ===

    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.read();
        let mut validators: Vec<Validator> = state.validators.values().cloned().collect();
        validators.sort_by(|a, b| a.identity.cmp(&b.identity));
        let mut members: Vec<(IdentityId, Location)> = state
            .geography
            .members()
            .map(|(id, loc)| (id.clone(), loc.clone()))
            .collect();
        members.sort_by(|a, b| a.0.cmp(&b.0));
        RegistrySnapshot {
            validators,
            members,
        }
    }

    /// Replace all contents with a snapshot.
    pub fn restore(&self, snapshot: RegistrySnapshot) -> RegistryResult<()> {
        let mut restored = RegistryState::default();
        for (identity, location) in &snapshot.members {
            restored.geography.upsert_member(location, identity);
        }
        for validator in snapshot.validators {
            if restored.validators.contains_key(&validator.identity) {
                return Err(RegistryError::DuplicateValidator {
                    identity: validator.identity,
                });
            }
            restored
                .geography
                .upsert_member(&validator.location, &validator.identity);
            restored
                .validators
                .insert(validator.identity.clone(), validator);
        }

        info!(
            "[cl-01] Restored {} validators, {} members",
            restored.validators.len(),
            restored.geography.member_count()
        );
        *self.state.write() = restored;
        Ok(())
    }
}
