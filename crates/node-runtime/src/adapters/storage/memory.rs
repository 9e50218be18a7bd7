//! In-memory snapshot store

use crate::adapters::ports::{KeystoreSnapshot, NodeSnapshot, PersistenceError, PersistenceStore};
use parking_lot::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    snapshot: RwLock<Option<NodeSnapshot>>,
    keys: RwLock<Option<KeystoreSnapshot>>,
    saves: RwLock<u64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing snapshot
    pub fn with_snapshot(snapshot: NodeSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Number of state saves so far
    pub fn save_count(&self) -> u64 {
        *self.saves.read()
    }
}

impl PersistenceStore for InMemoryStore {
    fn load_state(&self) -> Result<Option<NodeSnapshot>, PersistenceError> {
        Ok(self.snapshot.read().clone())
    }

    fn save_state(&self, snapshot: &NodeSnapshot) -> Result<(), PersistenceError> {
        *self.snapshot.write() = Some(snapshot.clone());
        *self.saves.write() += 1;
        Ok(())
    }

    fn load_keys(&self) -> Result<Option<KeystoreSnapshot>, PersistenceError> {
        Ok(self.keys.read().clone())
    }

    fn save_keys(&self, keys: &KeystoreSnapshot) -> Result<(), PersistenceError> {
        *self.keys.write() = Some(keys.clone());
        Ok(())
    }
}
