//! Block Commit Coordinator - Core business logic
//!
//! # Collection
//! `collect_signatures` fans out one signing task per active validator that has
//! not signed yet. Each call runs under `signature_timeout`; the whole round
//! runs under `collection_budget`. The round returns as soon as the quorum
//! snapshotted at proposal time is met. Pending tasks are aborted on return.
//!
//! Timed-out, failed and unverifiable signatures are logged and excluded.
//! Nothing is retried here; callers decide whether to run another round.

use crate::domain::{BlockProposal, CollectionReport, ProposalStatus, ValidatorSignature};
use crate::error::{CommitError, CommitResult, SignerError};
use crate::ports::SignatureProvider;
use cl_01_validator_registry::{Validator, ValidatorRegistry};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{Hash, IdentityId, SignatureRef, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

/// Coordinator configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitConfig {
    /// Per-validator signing timeout
    pub signature_timeout_ms: u64,
    /// Deadline for a whole collection round
    pub collection_budget_ms: u64,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            signature_timeout_ms: 2_000,
            collection_budget_ms: 10_000,
        }
    }
}

impl CommitConfig {
    pub fn signature_timeout(&self) -> Duration {
        Duration::from_millis(self.signature_timeout_ms)
    }

    pub fn collection_budget(&self) -> Duration {
        Duration::from_millis(self.collection_budget_ms)
    }
}

/// Dependencies for BlockCommitCoordinator
pub struct CommitDependencies {
    pub registry: Arc<ValidatorRegistry>,
    pub signer: Arc<dyn SignatureProvider>,
    pub time_source: Arc<dyn TimeSource>,
    pub config: CommitConfig,
}

type SignOutcome = (Validator, Result<Result<SignatureRef, SignerError>, tokio::time::error::Elapsed>);

/// Block Commit Coordinator (PoA layer)
pub struct BlockCommitCoordinator {
    registry: Arc<ValidatorRegistry>,
    signer: Arc<dyn SignatureProvider>,
    time_source: Arc<dyn TimeSource>,
    config: CommitConfig,
    proposals: RwLock<HashMap<Hash, BlockProposal>>,
}

impl BlockCommitCoordinator {
    pub fn new(deps: CommitDependencies) -> Self {
        Self {
            registry: deps.registry,
            signer: deps.signer,
            time_source: deps.time_source,
            config: deps.config,
            proposals: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CommitConfig {
        &self.config
    }

    fn not_found(block_hash: &Hash) -> CommitError {
        CommitError::NotFound {
            block_hash: hex::encode(block_hash),
        }
    }

    fn ensure_collecting(proposal: &BlockProposal) -> CommitResult<()> {
        if !proposal.is_collecting() {
            return Err(CommitError::NotCollecting {
                block_hash: proposal.hash_hex(),
                status: proposal.status,
            });
        }
        Ok(())
    }

    // === COMMANDS ===

    /// Open a signature set for a new block. Quorum is fixed from the
    /// current active-validator count.
    pub fn propose_block(&self, payload: Vec<u8>, producer: IdentityId) -> CommitResult<BlockProposal> {
        let active = self.registry.active_count(None, None);
        let proposal = BlockProposal::new(producer, payload, self.time_source.now(), active);

        let mut proposals = self.proposals.write();
        if proposals.contains_key(&proposal.block_hash) {
            return Err(CommitError::DuplicateProposal {
                block_hash: proposal.hash_hex(),
            });
        }
        proposals.insert(proposal.block_hash, proposal.clone());
        drop(proposals);

        info!(
            "[cl-04] Proposed block {} by {} ({} active validators, {} signatures required)",
            proposal.hash_hex(),
            proposal.producer,
            proposal.quorum.active_validators,
            proposal.quorum.required
        );
        Ok(proposal)
    }

    /// Run one collection round without external cancellation.
    pub async fn collect_signatures(&self, block_hash: Hash) -> CommitResult<CollectionReport> {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        self.collect_signatures_with_shutdown(block_hash, shutdown_rx).await
    }

    /// Run one collection round; stops early when `shutdown` flips to `true`.
    pub async fn collect_signatures_with_shutdown(
        &self,
        block_hash: Hash,
        mut shutdown: watch::Receiver<bool>,
    ) -> CommitResult<CollectionReport> {
        let targets: Vec<Validator> = {
            let proposals = self.proposals.read();
            let proposal = proposals
                .get(&block_hash)
                .ok_or_else(|| Self::not_found(&block_hash))?;
            Self::ensure_collecting(proposal)?;
            self.registry
                .active_validators()
                .into_iter()
                .filter(|v| !proposal.has_signed(&v.identity))
                .collect()
        };

        let mut report = CollectionReport {
            block_hash,
            requested: targets.len(),
            ..CollectionReport::default()
        };
        self.fill_totals(&block_hash, &mut report)?;
        if report.quorum_reached {
            debug!("[cl-04] Block {} already at quorum", hex::encode(block_hash));
            return Ok(report);
        }
        if *shutdown.borrow() {
            report.cancelled = true;
            return Ok(report);
        }

        let per_call = self.config.signature_timeout();
        let mut tasks: JoinSet<SignOutcome> = JoinSet::new();
        for validator in targets {
            let signer = Arc::clone(&self.signer);
            tasks.spawn(async move {
                let outcome = timeout(per_call, signer.sign(&validator.identity, &block_hash)).await;
                (validator, outcome)
            });
        }

        let deadline = Instant::now() + self.config.collection_budget();
        let mut shutdown_open = true;
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed(), if shutdown_open => {
                    match changed {
                        Ok(()) if *shutdown.borrow() => {
                            report.cancelled = true;
                            break;
                        }
                        Ok(()) => {}
                        Err(_) => shutdown_open = false,
                    }
                }
                _ = tokio::time::sleep_until(deadline) => {
                    report.budget_exhausted = true;
                    break;
                }
                joined = tasks.join_next() => {
                    let Some(joined) = joined else { break };
                    let (validator, outcome) = match joined {
                        Ok(result) => result,
                        Err(e) => {
                            warn!("[cl-04] Signing task failed: {}", e);
                            continue;
                        }
                    };
                    match self.accept_signature(&block_hash, &validator, outcome) {
                        Ok(true) => {
                            report.newly_collected += 1;
                            if self.fill_totals(&block_hash, &mut report)? {
                                break;
                            }
                        }
                        Ok(false) => {}
                        Err(CommitError::SignatureUnavailable { validator, reason }) => {
                            warn!("[cl-04] Excluding signature from {}: {}", validator, reason);
                            report.unavailable.push((validator, reason));
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        tasks.abort_all();

        self.fill_totals(&block_hash, &mut report)?;
        if report.budget_exhausted {
            warn!(
                "[cl-04] Collection budget exhausted for {} at {}/{}",
                hex::encode(block_hash),
                report.collected,
                report.required
            );
        }
        info!(
            "[cl-04] Collection round for {}: +{} signatures, {}/{} (quorum reached: {})",
            hex::encode(block_hash),
            report.newly_collected,
            report.collected,
            report.required,
            report.quorum_reached
        );
        Ok(report)
    }

    /// Verify one signing outcome and add it to the proposal.
    /// `Ok(false)` means the proposal left the collecting state or already held it.
    fn accept_signature(
        &self,
        block_hash: &Hash,
        validator: &Validator,
        outcome: Result<Result<SignatureRef, SignerError>, tokio::time::error::Elapsed>,
    ) -> CommitResult<bool> {
        let unavailable = |reason: String| CommitError::SignatureUnavailable {
            validator: validator.identity.clone(),
            reason,
        };
        let signature_ref = match outcome {
            Err(_) => return Err(unavailable("timed out".to_string())),
            Ok(Err(e)) => return Err(unavailable(e.to_string())),
            Ok(Ok(signature)) => signature,
        };
        if !self
            .signer
            .verify(&validator.public_key_ref, block_hash, &signature_ref)
        {
            return Err(unavailable("signature does not verify".to_string()));
        }

        let mut proposals = self.proposals.write();
        let proposal = proposals
            .get_mut(block_hash)
            .ok_or_else(|| Self::not_found(block_hash))?;
        if !proposal.is_collecting() {
            return Ok(false);
        }
        let added = proposal.add_signature(ValidatorSignature {
            validator: validator.identity.clone(),
            timestamp: self.time_source.now(),
            signature_ref,
        });
        if added {
            debug!(
                "[cl-04] Signature from {} on {} ({}/{})",
                validator.identity,
                proposal.hash_hex(),
                proposal.signatures.len(),
                proposal.quorum.required
            );
        }
        Ok(added)
    }

    /// Refresh totals from the stored proposal; returns `quorum_reached`.
    fn fill_totals(&self, block_hash: &Hash, report: &mut CollectionReport) -> CommitResult<bool> {
        let proposals = self.proposals.read();
        let proposal = proposals
            .get(block_hash)
            .ok_or_else(|| Self::not_found(block_hash))?;
        report.collected = proposal.signatures.len();
        report.required = proposal.quorum.required;
        report.quorum_reached = proposal.quorum_reached();
        Ok(report.quorum_reached)
    }

    /// Commit a proposal that holds a strict majority of signatures.
    pub fn commit(&self, block_hash: Hash) -> CommitResult<BlockProposal> {
        let mut proposals = self.proposals.write();
        let proposal = proposals
            .get_mut(&block_hash)
            .ok_or_else(|| Self::not_found(&block_hash))?;
        Self::ensure_collecting(proposal)?;

        if !proposal.quorum_reached() {
            warn!(
                "[cl-04] Refusing commit of {}: {}/{} signatures",
                proposal.hash_hex(),
                proposal.signatures.len(),
                proposal.quorum.required
            );
            return Err(CommitError::QuorumNotReached {
                collected: proposal.signatures.len(),
                required: proposal.quorum.required,
            });
        }

        proposal.status = ProposalStatus::Committed;
        proposal.committed_at = Some(self.time_source.now());
        info!(
            "[cl-04] Committed block {} with {}/{} signatures",
            proposal.hash_hex(),
            proposal.signatures.len(),
            proposal.quorum.active_validators
        );
        Ok(proposal.clone())
    }

    /// Abandon a collecting proposal.
    pub fn discard(&self, block_hash: Hash) -> CommitResult<BlockProposal> {
        let mut proposals = self.proposals.write();
        let proposal = proposals
            .get_mut(&block_hash)
            .ok_or_else(|| Self::not_found(&block_hash))?;
        Self::ensure_collecting(proposal)?;
        proposal.status = ProposalStatus::Discarded;
        info!("[cl-04] Discarded block {}", proposal.hash_hex());
        Ok(proposal.clone())
    }

    // === QUERIES ===

    pub fn proposal(&self, block_hash: &Hash) -> CommitResult<BlockProposal> {
        self.proposals
            .read()
            .get(block_hash)
            .cloned()
            .ok_or_else(|| Self::not_found(block_hash))
    }

    /// Hashes of proposals still collecting
    pub fn collecting(&self) -> Vec<Hash> {
        self.proposals
            .read()
            .values()
            .filter(|p| p.is_collecting())
            .map(|p| p.block_hash)
            .collect()
    }

    // === PERSISTENCE ===

    /// All proposals, ordered by proposal time
    pub fn snapshot(&self) -> Vec<BlockProposal> {
        let mut proposals: Vec<BlockProposal> = self.proposals.read().values().cloned().collect();
        proposals.sort_by(|a, b| {
            a.proposed_at
                .cmp(&b.proposed_at)
                .then(a.block_hash.cmp(&b.block_hash))
        });
        proposals
    }

    pub fn restore(&self, proposals: Vec<BlockProposal>) {
        let table: HashMap<Hash, BlockProposal> = proposals
            .into_iter()
            .map(|p| (p.block_hash, p))
            .collect();
        info!("[cl-04] Restored {} block proposals", table.len());
        *self.proposals.write() = table;
    }
}
