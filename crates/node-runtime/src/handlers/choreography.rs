//! # Inbound Event Handlers
//!
//! The core consumes two abstract events from the surrounding system:
//!
//! 1. `UserRegistered` → index the member; seat a validator if the role allows
//! 2. `BlockNeedsCommit` → propose, collect PoA signatures, commit at quorum
//!
//! A block short of quorum after one collection round stays `Collecting`; the
//! handler never retries on its own.
//!
//! Collection rounds run on their own tasks so a slow signer never holds up
//! the events queued behind it. On shutdown the loop waits for rounds in
//! flight; each of them sees the same shutdown signal.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use cl_01_validator_registry::{IdentityProfile, RegistryError, UpsertOutcome};
use cl_04_block_commit::{BlockProposal, CollectionReport, CommitError};
use shared_types::{IdentityId, Location, PublicKeyRef, Role};

use crate::container::SubsystemContainer;

/// Events published to the node by the surrounding system
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeEvent {
    UserRegistered {
        identity: IdentityId,
        role: Role,
        location: Location,
        /// Validator public key; generated in the local keystore when absent
        public_key: Option<PublicKeyRef>,
    },
    BlockNeedsCommit {
        producer: IdentityId,
        payload: Vec<u8>,
    },
}

/// Result of a user-registered event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentOutcome {
    pub identity: IdentityId,
    pub geography: UpsertOutcome,
    /// A validator seat was created by this event
    pub seated: bool,
}

/// Result of a block-needs-commit event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockCommitOutcome {
    Committed(BlockProposal),
    /// Quorum not reached in this round; the proposal keeps collecting
    Pending {
        proposal: BlockProposal,
        report: CollectionReport,
    },
}

/// Handler for inbound events.
#[derive(Clone)]
pub struct NodeEventHandler {
    container: Arc<SubsystemContainer>,
}

impl NodeEventHandler {
    pub fn new(container: Arc<SubsystemContainer>) -> Self {
        Self { container }
    }

    /// Index a newly registered user and seat it as validator when eligible.
    pub fn on_user_registered(
        &self,
        identity: IdentityId,
        role: Role,
        location: Location,
        public_key: Option<PublicKeyRef>,
    ) -> Result<EnrollmentOutcome, RegistryError> {
        let c = &self.container;
        c.directory.upsert(
            identity.clone(),
            IdentityProfile {
                role,
                location: location.clone(),
            },
        );
        let geography = c.registry.enroll_member(identity.clone(), location)?;

        let seated = if role.can_validate() && c.registry.lookup(&identity).is_err() {
            c.seat_validator(&identity, public_key, |key| {
                c.registry.register_from_directory(identity.clone(), key)
            })?;
            true
        } else {
            false
        };
        c.persist_change("user_registered");

        info!(
            "User {} registered as {} ({:?}, validator seat: {})",
            identity, role, geography, seated
        );
        Ok(EnrollmentOutcome {
            identity,
            geography,
            seated,
        })
    }

    /// Propose a block and run one signature collection round.
    pub async fn on_block_needs_commit(
        &self,
        producer: IdentityId,
        payload: Vec<u8>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<BlockCommitOutcome, CommitError> {
        let coordinator = &self.container.commit;
        let proposal = coordinator.propose_block(payload, producer)?;
        self.container.persist_change("block_proposed");
        let report = coordinator
            .collect_signatures_with_shutdown(proposal.block_hash, shutdown)
            .await?;

        if report.quorum_reached {
            let committed = coordinator.commit(proposal.block_hash)?;
            self.container.persist_change("block_committed");
            return Ok(BlockCommitOutcome::Committed(committed));
        }
        self.container.persist_change("signatures_collected");

        warn!(
            "Block {} short of quorum ({}/{}), left collecting",
            proposal.hash_hex(),
            report.collected,
            report.required
        );
        Ok(BlockCommitOutcome::Pending {
            proposal: coordinator.proposal(&proposal.block_hash)?,
            report,
        })
    }

    /// Dispatch one event. Failures are logged; the loop keeps going.
    ///
    /// Block commits are spawned onto `commits` instead of awaited here.
    pub fn dispatch(
        &self,
        event: NodeEvent,
        commits: &mut JoinSet<()>,
        shutdown: watch::Receiver<bool>,
    ) {
        match event {
            NodeEvent::UserRegistered {
                identity,
                role,
                location,
                public_key,
            } => {
                if let Err(e) = self.on_user_registered(identity, role, location, public_key) {
                    error!("User registration handling failed: {}", e);
                }
            }
            NodeEvent::BlockNeedsCommit { producer, payload } => {
                let handler = self.clone();
                commits.spawn(async move {
                    if let Err(e) = handler
                        .on_block_needs_commit(producer, payload, shutdown)
                        .await
                    {
                        error!("Block commit handling failed: {}", e);
                    }
                });
            }
        }
    }

    /// Run the handler loop until the channel closes or shutdown is signalled,
    /// then wait for block commits still in flight.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<NodeEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("Node event handler started");
        let mut commits = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Node event handler shutting down");
                    break;
                }
                Some(joined) = commits.join_next(), if !commits.is_empty() => {
                    if let Err(e) = joined {
                        error!("Block commit task failed: {}", e);
                    }
                }
                received = receiver.recv() => match received {
                    Ok(event) => self.dispatch(event, &mut commits, shutdown.clone()),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Node event handler lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Event channel closed, handler stopping");
                        break;
                    }
                },
            }
        }

        while let Some(joined) = commits.join_next().await {
            if let Err(e) = joined {
                error!("Block commit task failed: {}", e);
            }
        }
        info!("Node event handler stopped");
    }
}
