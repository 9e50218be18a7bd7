//! # Node Adapters
//!
//! - `ports/`: contracts for injected capabilities (persistence)
//! - `storage/`: snapshot store implementations

pub mod ports;
pub mod storage;

pub use ports::{
    KeystoreSnapshot, NodeSnapshot, PersistenceError, PersistenceStore, StoredKey,
    KEYSTORE_VERSION, SNAPSHOT_VERSION,
};
pub use storage::{FileSnapshotStore, InMemoryStore};
