//! In-memory identity directory adapter
//!
//! Implements the IdentityDirectory port for tests and single-process nodes.

use crate::ports::{IdentityDirectory, IdentityProfile};
use parking_lot::RwLock;
use shared_types::IdentityId;
use std::collections::HashMap;

/// In-memory identity directory
#[derive(Default)]
pub struct InMemoryIdentityDirectory {
    profiles: RwLock<HashMap<IdentityId, IdentityProfile>>,
}

impl InMemoryIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile
    pub fn upsert(&self, identity: IdentityId, profile: IdentityProfile) {
        self.profiles.write().insert(identity, profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

impl IdentityDirectory for InMemoryIdentityDirectory {
    fn lookup(&self, identity: &IdentityId) -> Option<IdentityProfile> {
        self.profiles.read().get(identity).cloned()
    }
}
