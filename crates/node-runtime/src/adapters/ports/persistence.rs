//! Persistence port
//!
//! The node keeps all state in memory and commits it through `checkpoint()`.
//! A store saves and loads one whole-node snapshot plus the local signing
//! keys, which are kept apart from the shareable state.

use cl_01_validator_registry::RegistrySnapshot;
use cl_03_validation_requests::ValidationRequest;
use cl_04_block_commit::BlockProposal;
use serde::{Deserialize, Serialize};
use shared_types::{ErrorCode, IdentityId, Timestamp};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Snapshot format version written by this build
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to rebuild the node's in-memory state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub version: u32,
    pub taken_at: Timestamp,
    pub registry: RegistrySnapshot,
    pub requests: Vec<ValidationRequest>,
    pub proposals: Vec<BlockProposal>,
}

impl NodeSnapshot {
    pub fn new(
        taken_at: Timestamp,
        registry: RegistrySnapshot,
        requests: Vec<ValidationRequest>,
        proposals: Vec<BlockProposal>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            taken_at,
            registry,
            requests,
            proposals,
        }
    }
}

/// Keystore format version written by this build
pub const KEYSTORE_VERSION: u32 = 1;

/// One local Ed25519 signing key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredKey {
    pub identity: IdentityId,
    pub seed: [u8; 32],
}

impl fmt::Debug for StoredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredKey")
            .field("identity", &self.identity)
            .field("seed", &"<redacted>")
            .finish()
    }
}

/// Local signing keys, ordered by identity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreSnapshot {
    pub version: u32,
    pub keys: Vec<StoredKey>,
}

impl KeystoreSnapshot {
    pub fn new(keys: Vec<StoredKey>) -> Self {
        Self {
            version: KEYSTORE_VERSION,
            keys,
        }
    }
}

/// Persistence errors. `Corrupted` is fatal at startup.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Persisted state is corrupted: {0}")]
    Corrupted(String),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Failed to encode snapshot: {0}")]
    Encode(String),
}

impl ErrorCode for PersistenceError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "storage_io",
            Self::Corrupted(_) => "storage_corrupted",
            Self::UnsupportedVersion { .. } => "unsupported_snapshot_version",
            Self::Encode(_) => "storage_encode",
        }
    }
}

/// Whole-node snapshot store
pub trait PersistenceStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet
    fn load_state(&self) -> Result<Option<NodeSnapshot>, PersistenceError>;

    fn save_state(&self, snapshot: &NodeSnapshot) -> Result<(), PersistenceError>;

    /// `Ok(None)` when no keys have been saved yet
    fn load_keys(&self) -> Result<Option<KeystoreSnapshot>, PersistenceError>;

    fn save_keys(&self, keys: &KeystoreSnapshot) -> Result<(), PersistenceError>;
}
