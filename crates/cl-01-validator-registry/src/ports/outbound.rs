//! Driven ports (Outbound dependencies)

use shared_types::{IdentityId, Location, Role};

/// Role and location of a participant as known to user management.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityProfile {
    pub role: Role,
    pub location: Location,
}

/// Identity directory owned by the external user-management module.
///
/// Used to resolve role/location for newly registering validators.
pub trait IdentityDirectory: Send + Sync {
    fn lookup(&self, identity: &IdentityId) -> Option<IdentityProfile>;
}
