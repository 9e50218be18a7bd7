//! # Civic Validation API
//!
//! The surface exposed to outer layers (UI, reporting, policy). Every
//! operation returns an [`ApiResponse`]; failures carry the typed error's
//! message with `success = false`.
//!
//! String inputs (roles, levels, tiers) are parsed here and nowhere else.
//! Successful mutations are followed by
//! [`SubsystemContainer::persist_change`].

use std::str::FromStr;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::watch;
use uuid::Uuid;

use cl_01_validator_registry::RegistryError;
use cl_03_validation_requests::ValidationRequestEngine;
use shared_types::{
    ApiResponse, Hash, IdentityId, Location, PublicKeyRef, Role, SignatureRef, Tier,
};

use crate::container::SubsystemContainer;

/// Exposed validation API over a running container
#[derive(Clone)]
pub struct CivicValidationApi {
    container: Arc<SubsystemContainer>,
}

impl CivicValidationApi {
    pub fn new(container: Arc<SubsystemContainer>) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &Arc<SubsystemContainer> {
        &self.container
    }

    fn persist_if_ok<T, E>(&self, operation: &str, result: &Result<T, E>) {
        if result.is_ok() {
            self.container.persist_change(operation);
        }
    }

    // =========================================================================
    // VALIDATOR REGISTRY
    // =========================================================================

    /// Seat a validator. Without `public_key` a key is generated in the local keystore.
    pub fn register_validator(
        &self,
        identity: &str,
        role: &str,
        location: Location,
        public_key: Option<PublicKeyRef>,
    ) -> ApiResponse {
        let role = match Role::from_str(role) {
            Ok(role) => role,
            Err(_) => {
                return ApiResponse::failure(RegistryError::IneligibleRole {
                    role: role.to_string(),
                })
            }
        };
        let identity = IdentityId::from(identity);
        if !role.can_validate() {
            return ApiResponse::failure(RegistryError::IneligibleRole {
                role: role.to_string(),
            });
        }

        let result = self.container.seat_validator(&identity, public_key, |key| {
            self.container
                .registry
                .register(identity.clone(), role, location, key)
        });
        self.persist_if_ok("register_validator", &result);
        ApiResponse::from_result(result, "Validator registered")
    }

    /// Replace a validator's public key. Without `public_key` a fresh local key
    /// is generated; the previous local key is kept if the registry refuses.
    pub fn rotate_validator_key(
        &self,
        identity: &str,
        public_key: Option<PublicKeyRef>,
    ) -> ApiResponse {
        let identity = IdentityId::from(identity);
        let keystore = &self.container.keystore;
        let previous = keystore
            .export_seeds()
            .into_iter()
            .find(|(id, _)| id == &identity);
        let public_key = match public_key {
            Some(key) => {
                keystore.remove_key(&identity);
                key
            }
            None => keystore.generate_key(&identity),
        };
        let result = self.container.registry.rotate_key(&identity, public_key);
        if result.is_err() {
            keystore.remove_key(&identity);
            keystore.import_seeds(previous);
        }
        self.persist_if_ok("rotate_validator_key", &result);
        ApiResponse::from_result(result, "Validator key rotated")
    }

    pub fn deactivate_validator(&self, identity: &str, reason: &str) -> ApiResponse {
        let result = self
            .container
            .registry
            .deactivate(&IdentityId::from(identity), reason);
        self.persist_if_ok("deactivate_validator", &result);
        ApiResponse::from_result(result, "Validator deactivated")
    }

    pub fn reactivate_validator(&self, identity: &str) -> ApiResponse {
        let result = self.container.registry.reactivate(&IdentityId::from(identity));
        self.persist_if_ok("reactivate_validator", &result);
        ApiResponse::from_result(result, "Validator reactivated")
    }

    /// Record a plain member in the geographic index
    pub fn enroll_member(&self, identity: &str, location: Location) -> ApiResponse {
        let result = self
            .container
            .registry
            .enroll_member(IdentityId::from(identity), location);
        self.persist_if_ok("enroll_member", &result);
        ApiResponse::from_result(result, "Member enrolled")
    }

    // =========================================================================
    // VALIDATION REQUESTS
    // =========================================================================

    pub fn create_validation_request(
        &self,
        block_hash: Hash,
        level: &str,
        requester: &str,
        payload: Vec<u8>,
    ) -> ApiResponse {
        let level = match ValidationRequestEngine::parse_level(level) {
            Ok(level) => level,
            Err(e) => return ApiResponse::failure(e),
        };
        let result =
            self.container
                .validation
                .create(block_hash, level, IdentityId::from(requester), payload);
        self.persist_if_ok("create_validation_request", &result);
        ApiResponse::from_result(result, "Validation request created")
    }

    pub fn submit_validation(
        &self,
        request_id: Uuid,
        validator: &str,
        tier: &str,
        approve: bool,
        signature_ref: SignatureRef,
    ) -> ApiResponse {
        let tier = match Tier::from_str(tier) {
            Ok(tier) => tier,
            Err(e) => return ApiResponse::failure(e),
        };
        let result = self.container.validation.submit_validation(
            request_id,
            &IdentityId::from(validator),
            tier,
            approve,
            signature_ref,
        );
        self.persist_if_ok("submit_validation", &result);
        let message = match &result {
            Ok(receipt) if receipt.consensus_reached => "Validation accepted; consensus reached",
            _ => "Validation accepted",
        };
        ApiResponse::from_result(result, message)
    }

    pub fn get_validation_status(&self, request_id: Uuid) -> ApiResponse {
        ApiResponse::from_result(
            self.container.validation.get_validation_status(request_id),
            "Validation status",
        )
    }

    // =========================================================================
    // BLOCK COMMIT (PoA)
    // =========================================================================

    pub fn propose_block(&self, payload: Vec<u8>, producer: &str) -> ApiResponse {
        match self
            .container
            .commit
            .propose_block(payload, IdentityId::from(producer))
        {
            Ok(proposal) => {
                self.container.persist_change("propose_block");
                ApiResponse::ok(
                "Block proposed",
                &json!({
                    "block_hash": proposal.hash_hex(),
                    "active_validators": proposal.quorum.active_validators,
                    "required_signatures": proposal.quorum.required,
                }),
                )
            }
            Err(e) => ApiResponse::failure(e),
        }
    }

    pub async fn collect_signatures(&self, block_hash: Hash) -> ApiResponse {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        self.collect_signatures_with_shutdown(block_hash, shutdown_rx)
            .await
    }

    pub async fn collect_signatures_with_shutdown(
        &self,
        block_hash: Hash,
        shutdown: watch::Receiver<bool>,
    ) -> ApiResponse {
        let result = self
            .container
            .commit
            .collect_signatures_with_shutdown(block_hash, shutdown)
            .await;
        self.persist_if_ok("collect_signatures", &result);
        let message = match &result {
            Ok(report) if report.quorum_reached => "Signatures collected; quorum reached",
            _ => "Signatures collected; quorum not reached",
        };
        ApiResponse::from_result(result, message)
    }

    pub fn commit_block(&self, block_hash: Hash) -> ApiResponse {
        let result = self.container.commit.commit(block_hash);
        self.persist_if_ok("commit_block", &result);
        ApiResponse::from_result(result, "Block committed")
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Commit in-memory state through the persistence store
    pub fn checkpoint(&self) -> ApiResponse {
        match self.container.checkpoint() {
            Ok(snapshot) => ApiResponse::ok(
                "Checkpoint saved",
                &json!({
                    "taken_at": snapshot.taken_at,
                    "validators": snapshot.registry.validators.len(),
                    "requests": snapshot.requests.len(),
                    "proposals": snapshot.proposals.len(),
                }),
            ),
            Err(e) => ApiResponse::failure(e),
        }
    }
}
