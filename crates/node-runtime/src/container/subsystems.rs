//! # Subsystem Container
//!
//! Holds all subsystem instances and manages their lifecycle.
//!
//! ## Initialization Order
//!
//! ```text
//! Level 0: clock, identity directory, snapshot store
//! Level 1: Validator Registry (cl-01)
//! Level 2: Validation Request Engine (cl-03), thresholds from cl-02
//! Level 3: Block Commit Coordinator (cl-04), Ed25519 keystore
//! Level 4: restore signing keys, then the last state snapshot
//! ```
//!
//! ## Persistence
//!
//! With `checkpoint_on_write` set, every successful mutation through the API,
//! the event handler or the expiry sweep ends in [`SubsystemContainer::persist_change`].
//! Signing keys are written before the state that references them.
//!
//! ## Thread Safety
//!
//! Every subsystem is an explicit object shared through `Arc`; each guards its
//! own state with `parking_lot` locks. There are no globals.

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use cl_01_validator_registry::{
    InMemoryIdentityDirectory, RegistryResult, Validator, ValidatorRegistry,
};
use cl_03_validation_requests::{
    InMemoryEventSink, ValidationDependencies, ValidationRequestEngine,
};
use cl_04_block_commit::{
    BlockCommitCoordinator, CommitDependencies, Ed25519SignatureProvider, SignatureProvider,
};
use shared_types::{IdentityId, PublicKeyRef, SystemTimeSource, TimeSource};

use crate::adapters::{
    FileSnapshotStore, InMemoryStore, KeystoreSnapshot, NodeSnapshot, PersistenceError,
    PersistenceStore, StoredKey,
};
use crate::container::config::NodeConfig;

/// Central container holding all subsystem instances.
pub struct SubsystemContainer {
    pub config: NodeConfig,
    pub time_source: Arc<dyn TimeSource>,

    // =========================================================================
    // LEVEL 0
    // =========================================================================
    /// Role/location of known users, fed by user-registered events
    pub directory: Arc<InMemoryIdentityDirectory>,
    pub store: Arc<dyn PersistenceStore>,

    // =========================================================================
    // LEVEL 1-3
    // =========================================================================
    pub registry: Arc<ValidatorRegistry>,
    /// Audit stream of the validation engine
    pub events: Arc<InMemoryEventSink>,
    pub validation: Arc<ValidationRequestEngine>,
    /// Local signing keys for PoA collection
    pub keystore: Arc<Ed25519SignatureProvider>,
    pub commit: Arc<BlockCommitCoordinator>,

    /// Held across snapshot and save so stored state never goes backwards
    checkpoint_lock: Mutex<()>,
}

impl SubsystemContainer {
    /// Build with the system clock and the store selected by `config`.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let store: Arc<dyn PersistenceStore> = match &config.persistence.snapshot_path {
            Some(path) => {
                info!("Using snapshot file {:?}", path);
                Arc::new(FileSnapshotStore::new(path.clone()))
            }
            None => {
                info!("No snapshot path configured, state is in-memory only");
                Arc::new(InMemoryStore::new())
            }
        };
        Self::with_dependencies(config, store, Arc::new(SystemTimeSource))
    }

    /// Build with explicit store and clock, then restore from the store.
    pub fn with_dependencies(
        config: NodeConfig,
        store: Arc<dyn PersistenceStore>,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        Self::build(config, store, time_source, None)
    }

    /// Like [`Self::with_dependencies`], but PoA signatures come from `signer`
    /// instead of the local keystore.
    pub fn with_signer(
        config: NodeConfig,
        store: Arc<dyn PersistenceStore>,
        time_source: Arc<dyn TimeSource>,
        signer: Arc<dyn SignatureProvider>,
    ) -> Result<Self> {
        Self::build(config, store, time_source, Some(signer))
    }

    fn build(
        config: NodeConfig,
        store: Arc<dyn PersistenceStore>,
        time_source: Arc<dyn TimeSource>,
        signer: Option<Arc<dyn SignatureProvider>>,
    ) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        let directory = Arc::new(InMemoryIdentityDirectory::new());
        let registry = Arc::new(
            ValidatorRegistry::new(Arc::clone(&time_source)).with_directory(directory.clone()),
        );

        let events = Arc::new(InMemoryEventSink::new());
        let validation = Arc::new(
            ValidationRequestEngine::new(ValidationDependencies {
                registry: Arc::clone(&registry),
                time_source: Arc::clone(&time_source),
                events: events.clone(),
                config: config.validation.clone(),
            })
            .context("Failed to create validation engine")?,
        );

        let keystore = Arc::new(Ed25519SignatureProvider::new());
        let signer = signer.unwrap_or_else(|| keystore.clone() as Arc<dyn SignatureProvider>);
        let commit = Arc::new(BlockCommitCoordinator::new(CommitDependencies {
            registry: Arc::clone(&registry),
            signer,
            time_source: Arc::clone(&time_source),
            config: config.commit.clone(),
        }));

        let container = Self {
            config,
            time_source,
            directory,
            store,
            registry,
            events,
            validation,
            keystore,
            commit,
            checkpoint_lock: Mutex::new(()),
        };
        container.restore()?;
        Ok(container)
    }

    /// Load persisted keys and the last snapshot, if any, into every subsystem.
    fn restore(&self) -> Result<()> {
        if let Some(keys) = self
            .store
            .load_keys()
            .context("Failed to load signing keys")?
        {
            let imported = self
                .keystore
                .import_seeds(keys.keys.into_iter().map(|k| (k.identity, k.seed)));
            info!("Restored {} signing keys", imported);
        }

        let Some(snapshot) = self
            .store
            .load_state()
            .context("Failed to load persisted state")?
        else {
            return Ok(());
        };

        self.registry
            .restore(snapshot.registry)
            .context("Persisted registry is inconsistent")?;
        self.validation.restore(snapshot.requests);
        self.commit.restore(snapshot.proposals);

        let keyless = self
            .registry
            .active_validators()
            .into_iter()
            .filter(|v| !self.keystore.has_key(&v.identity))
            .count();
        if keyless > 0 {
            warn!(
                "{} active validators have no local signing key; their PoA signatures will be unavailable",
                keyless
            );
        }
        info!("Restored state from snapshot taken at {}", snapshot.taken_at);
        Ok(())
    }

    /// Current state of every subsystem
    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot::new(
            self.time_source.now(),
            self.registry.snapshot(),
            self.validation.snapshot(),
            self.commit.snapshot(),
        )
    }

    /// Local signing keys in their persisted form
    pub fn keystore_snapshot(&self) -> KeystoreSnapshot {
        KeystoreSnapshot::new(
            self.keystore
                .export_seeds()
                .into_iter()
                .map(|(identity, seed)| StoredKey { identity, seed })
                .collect(),
        )
    }

    /// Commit keys and in-memory state through the persistence store.
    pub fn checkpoint(&self) -> Result<NodeSnapshot, PersistenceError> {
        let _guard = self.checkpoint_lock.lock();
        self.store.save_keys(&self.keystore_snapshot())?;
        let snapshot = self.snapshot();
        self.store.save_state(&snapshot)?;
        debug!(
            "Checkpoint: {} validators, {} requests, {} proposals",
            snapshot.registry.validators.len(),
            snapshot.requests.len(),
            snapshot.proposals.len()
        );
        Ok(snapshot)
    }

    /// Checkpoint after a successful mutation when `checkpoint_on_write` is set.
    ///
    /// A failed write is logged; the in-memory change stands and the next
    /// checkpoint retries.
    pub fn persist_change(&self, operation: &str) {
        if !self.config.persistence.checkpoint_on_write {
            return;
        }
        if let Err(e) = self.checkpoint() {
            error!("Checkpoint after {} failed: {}", operation, e);
        }
    }

    /// Key for a new seat: the supplied one, an existing local key, or a fresh
    /// local key. The flag is true only when a key was generated here.
    pub fn resolve_signing_key(
        &self,
        identity: &IdentityId,
        supplied: Option<PublicKeyRef>,
    ) -> (PublicKeyRef, bool) {
        if let Some(key) = supplied {
            return (key, false);
        }
        match self.keystore.public_key(identity) {
            Some(existing) => (existing, false),
            None => (self.keystore.generate_key(identity), true),
        }
    }

    /// Run `register` with a resolved key; a key generated for it is dropped
    /// again if registration fails.
    pub fn seat_validator<F>(
        &self,
        identity: &IdentityId,
        supplied: Option<PublicKeyRef>,
        register: F,
    ) -> RegistryResult<Validator>
    where
        F: FnOnce(PublicKeyRef) -> RegistryResult<Validator>,
    {
        let (public_key, generated) = self.resolve_signing_key(identity, supplied);
        let result = register(public_key);
        if result.is_err() && generated {
            self.keystore.remove_key(identity);
        }
        result
    }
}
