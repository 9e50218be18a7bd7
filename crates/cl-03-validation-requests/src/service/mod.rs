//! Validation Request Engine - Core business logic
//!
//! # Concurrency
//! The request table is an `RwLock<HashMap<_, Arc<Mutex<_>>>>`. Submissions on
//! the same request serialize on its mutex, so the consensus check always sees
//! a consistent `tiers_received`. Submissions on different requests proceed in
//! parallel. Events are published after the request lock is released.
//!
//! # Expiry
//! Detected lazily on every mutation attempt and status read; `sweep_expired`
//! is available for periodic reporting.

use crate::domain::{
    EligibilityChecker, IneligibilityReason, RequestStatus, ValidationRecord, ValidationRequest,
};
use crate::error::{ValidationError, ValidationResult};
use crate::events::ValidationEvent;
use crate::metrics;
use crate::ports::EventSink;
use cl_01_validator_registry::{GeoFilter, ValidatorRegistry};
use cl_02_consensus::{evaluate_tiered, ConsensusThresholds, FinalResult, TierReport};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use shared_types::{
    Hash, IdentityId, Role, SignatureRef, Tier, TimeSource, Timestamp, ValidationLevel,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Validation engine configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Per-tier thresholds, read at request creation
    pub thresholds: ConsensusThresholds,
    /// Lowest role accepted on the role tier
    pub role_tier_minimum: Role,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            thresholds: ConsensusThresholds::default(),
            role_tier_minimum: Role::Senator,
        }
    }
}

/// Dependencies for ValidationRequestEngine
pub struct ValidationDependencies {
    pub registry: Arc<ValidatorRegistry>,
    pub time_source: Arc<dyn TimeSource>,
    pub events: Arc<dyn EventSink>,
    pub config: ValidationConfig,
}

/// Returned by a successful submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub request_id: Uuid,
    pub record: ValidationRecord,
    pub status: RequestStatus,
    pub consensus_reached: bool,
    pub final_result: Option<FinalResult>,
    pub version: u64,
}

/// Per-tier progress for status reporting
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStatus {
    pub report: TierReport,
    /// Active validators currently able to vote on this tier
    pub eligible_pool: usize,
}

/// Status report for outer layers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStatus {
    pub request_id: Uuid,
    pub target_block_hash: Hash,
    pub level: ValidationLevel,
    pub status: RequestStatus,
    pub consensus_reached: bool,
    pub final_result: Option<FinalResult>,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub tiers: Vec<TierStatus>,
}

/// Validation Request Engine
pub struct ValidationRequestEngine {
    registry: Arc<ValidatorRegistry>,
    time_source: Arc<dyn TimeSource>,
    events: Arc<dyn EventSink>,
    config: ValidationConfig,
    requests: RwLock<HashMap<Uuid, Arc<Mutex<ValidationRequest>>>>,
}

impl ValidationRequestEngine {
    /// Create a new engine. Fails if the threshold table is invalid.
    pub fn new(deps: ValidationDependencies) -> ValidationResult<Self> {
        deps.config.thresholds.validate()?;
        Ok(Self {
            registry: deps.registry,
            time_source: deps.time_source,
            events: deps.events,
            config: deps.config,
            requests: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Parse a level name from an outer layer
    pub fn parse_level(level: &str) -> ValidationResult<ValidationLevel> {
        ValidationLevel::from_str(level).map_err(|_| ValidationError::InvalidLevel {
            level: level.to_string(),
        })
    }

    fn handle(&self, request_id: Uuid) -> ValidationResult<Arc<Mutex<ValidationRequest>>> {
        self.requests
            .read()
            .get(&request_id)
            .cloned()
            .ok_or(ValidationError::NotFound { request_id })
    }

    /// Expire in place if pending and past the deadline.
    fn expire_if_due(request: &mut ValidationRequest, now: Timestamp) -> Option<ValidationEvent> {
        if request.is_pending() && request.is_past_expiry(now) {
            request.mark_expired(now);
            info!(
                "[cl-03] Request {} expired (deadline {}, now {})",
                request.id, request.expires_at, now
            );
            metrics::record_expired();
            return Some(ValidationEvent::RequestExpired {
                request_id: request.id,
                at: now,
            });
        }
        None
    }

    // === COMMANDS ===

    /// Open a validation request for a block.
    pub fn create(
        &self,
        block_hash: Hash,
        level: ValidationLevel,
        requester: IdentityId,
        payload: Vec<u8>,
    ) -> ValidationResult<ValidationRequest> {
        let now = self.time_source.now();
        let requester_location = self.registry.get_location(&requester).ok();
        if requester_location.is_none() {
            warn!(
                "[cl-03] Requester {} has no indexed location; jurisdiction tiers cannot be met",
                requester
            );
        }

        let window = self.config.thresholds.window_for(level.required_tiers());
        let request = ValidationRequest::new(
            block_hash,
            requester.clone(),
            requester_location,
            level,
            self.config.role_tier_minimum,
            payload,
            now,
            window,
        );

        self.requests
            .write()
            .insert(request.id, Arc::new(Mutex::new(request.clone())));

        info!(
            "[cl-03] Created {} request {} for block {}.. by {}",
            level,
            request.id,
            hex::encode(&block_hash[..4]),
            requester
        );
        metrics::record_request_created();
        self.events.publish(ValidationEvent::RequestCreated {
            request_id: request.id,
            block_hash,
            requester,
            level,
            expires_at: request.expires_at,
        });
        Ok(request)
    }

    /// Accept one attestation.
    pub fn submit_validation(
        &self,
        request_id: Uuid,
        validator: &IdentityId,
        tier: Tier,
        approve: bool,
        signature_ref: SignatureRef,
    ) -> ValidationResult<SubmissionReceipt> {
        let handle = self.handle(request_id)?;
        let mut pending_events = Vec::new();

        let result = {
            let mut request = handle.lock();
            let now = self.time_source.now();
            self.apply_submission(
                &mut request,
                validator,
                tier,
                approve,
                signature_ref,
                now,
                &mut pending_events,
            )
        };

        for event in pending_events {
            self.events.publish(event);
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_submission(
        &self,
        request: &mut ValidationRequest,
        validator: &IdentityId,
        tier: Tier,
        approve: bool,
        signature_ref: SignatureRef,
        now: Timestamp,
        pending_events: &mut Vec<ValidationEvent>,
    ) -> ValidationResult<SubmissionReceipt> {
        if !request.is_pending() {
            metrics::record_rejected("closed");
            return Err(ValidationError::RequestClosed {
                request_id: request.id,
                status: request.status,
            });
        }

        if let Some(event) = Self::expire_if_due(request, now) {
            pending_events.push(event);
            metrics::record_rejected("expired");
            return Err(ValidationError::RequestExpired {
                request_id: request.id,
                expires_at: request.expires_at,
            });
        }

        let (decision, candidate) =
            EligibilityChecker::new(&self.registry).check(request, validator, tier);
        let candidate = match candidate {
            Some(candidate) if decision.eligible => candidate,
            _ => {
                let reason = decision
                    .reason
                    .unwrap_or(IneligibilityReason::UnknownValidator);
                warn!(
                    "[cl-03] Denied {} on {} tier of {}: {}",
                    validator, tier, request.id, reason
                );
                metrics::record_rejected("not_eligible");
                return Err(ValidationError::NotEligible {
                    validator: validator.clone(),
                    tier,
                    reason,
                });
            }
        };

        // Registry first: a failure here must leave the request untouched
        if let Err(e) = self.registry.record_validation(validator, now) {
            warn!(
                "[cl-03] Registry refused {} vote from {} on {}: {}",
                tier, validator, request.id, e
            );
            metrics::record_rejected("registry");
            return Err(e.into());
        }
        let record = ValidationRecord {
            validator: validator.clone(),
            tier,
            approve,
            timestamp: now,
            signature_ref,
            validator_location: candidate.location,
        };
        request.append_record(record.clone());

        debug!(
            "[cl-03] Accepted {} {} vote from {} on {} (v{})",
            tier,
            if approve { "approve" } else { "reject" },
            validator,
            request.id,
            request.version
        );
        metrics::record_accepted(tier.as_str());
        pending_events.push(ValidationEvent::RecordAccepted {
            request_id: request.id,
            validator: validator.clone(),
            tier,
            approve,
            at: now,
        });

        let outcome = evaluate_tiered(&request.tier_votes(), &self.config.thresholds);
        if let (true, Some(result)) = (outcome.reached, outcome.final_result) {
            request.mark_completed(result, now);
            info!(
                "[cl-03] Consensus reached on {}: {:?} ({} records)",
                request.id,
                result,
                request.total_records()
            );
            metrics::record_consensus(match result {
                FinalResult::Approved => "approved",
                FinalResult::Rejected => "rejected",
            });
            pending_events.push(ValidationEvent::ConsensusReached {
                request_id: request.id,
                final_result: result,
                at: now,
            });
        }

        Ok(SubmissionReceipt {
            request_id: request.id,
            record,
            status: request.status,
            consensus_reached: request.consensus_reached,
            final_result: request.final_result,
            version: request.version,
        })
    }

    /// Expire every pending request past its deadline. Returns the expired ids.
    pub fn sweep_expired(&self) -> Vec<Uuid> {
        let now = self.time_source.now();
        let handles: Vec<Arc<Mutex<ValidationRequest>>> =
            self.requests.read().values().cloned().collect();

        let mut expired = Vec::new();
        for handle in handles {
            let event = Self::expire_if_due(&mut handle.lock(), now);
            if let Some(event) = event {
                expired.push(event.request_id());
                self.events.publish(event);
            }
        }
        if !expired.is_empty() {
            info!("[cl-03] Sweep expired {} requests", expired.len());
        }
        expired
    }

    // === QUERIES ===

    /// Status report; applies lazy expiry first.
    pub fn get_validation_status(&self, request_id: Uuid) -> ValidationResult<ValidationStatus> {
        let handle = self.handle(request_id)?;
        let (snapshot, event) = {
            let mut request = handle.lock();
            let event = Self::expire_if_due(&mut request, self.time_source.now());
            (request.clone(), event)
        };
        if let Some(event) = event {
            self.events.publish(event);
        }

        let outcome = evaluate_tiered(&snapshot.tier_votes(), &self.config.thresholds);
        let tiers = outcome
            .tiers
            .into_iter()
            .map(|report| TierStatus {
                eligible_pool: self.eligible_pool(&snapshot, report.tier),
                report,
            })
            .collect();

        Ok(ValidationStatus {
            request_id: snapshot.id,
            target_block_hash: snapshot.target_block_hash,
            level: snapshot.level,
            status: snapshot.status,
            consensus_reached: snapshot.consensus_reached,
            final_result: snapshot.final_result,
            created_at: snapshot.created_at,
            expires_at: snapshot.expires_at,
            tiers,
        })
    }

    /// Active validators who could vote on `tier` (ignoring votes already cast)
    fn eligible_pool(&self, request: &ValidationRequest, tier: Tier) -> usize {
        match tier {
            Tier::Founder => self.registry.active_count(Some(Role::Founder), None),
            Tier::Role => self.registry.active_count(Some(request.minimum_role), None),
            Tier::City | Tier::State | Tier::Country => {
                match (tier.geo_level(), &request.requester_location) {
                    (Some(level), Some(location)) => {
                        let filter = GeoFilter::new(level, location.clone());
                        self.registry.active_count(None, Some(&filter))
                    }
                    _ => 0,
                }
            }
        }
    }

    /// Raw request, without applying expiry
    pub fn request(&self, request_id: Uuid) -> ValidationResult<ValidationRequest> {
        Ok(self.handle(request_id)?.lock().clone())
    }

    pub fn pending_requests(&self) -> Vec<Uuid> {
        self.requests
            .read()
            .iter()
            .filter(|(_, handle)| handle.lock().is_pending())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().len()
    }

    // === PERSISTENCE ===

    /// All requests, ordered by creation time
    pub fn snapshot(&self) -> Vec<ValidationRequest> {
        let mut requests: Vec<ValidationRequest> = self
            .requests
            .read()
            .values()
            .map(|handle| handle.lock().clone())
            .collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        requests
    }

    /// Replace all requests with a snapshot
    pub fn restore(&self, requests: Vec<ValidationRequest>) {
        let table: HashMap<Uuid, Arc<Mutex<ValidationRequest>>> = requests
            .into_iter()
            .map(|request| (request.id, Arc::new(Mutex::new(request))))
            .collect();
        info!("[cl-03] Restored {} validation requests", table.len());
        *self.requests.write() = table;
    }
}
