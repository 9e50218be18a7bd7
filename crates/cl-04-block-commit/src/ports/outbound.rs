//! Driven ports (Outbound dependencies)

use crate::error::SignerError;
use async_trait::async_trait;
use shared_types::{IdentityId, SignatureRef};

/// Signing capability for registry validators.
///
/// `sign` may reach a remote validator and is awaited under a per-call
/// timeout. `verify` is local and must not block.
#[async_trait]
pub trait SignatureProvider: Send + Sync {
    /// Ask `validator` to sign `message`
    async fn sign(&self, validator: &IdentityId, message: &[u8]) -> Result<SignatureRef, SignerError>;

    /// Check `signature` over `message` against a registry public key
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool;
}
