//! Ed25519 signature provider over a local keystore
//!
//! Suitable for single-node deployments and simulations where every
//! validator key lives in this process. Seeds can be exported and imported
//! so the embedding node can persist them.

use crate::error::SignerError;
use crate::ports::SignatureProvider;
use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use parking_lot::RwLock;
use shared_types::{IdentityId, PublicKeyRef, SignatureRef};
use std::collections::HashMap;

pub struct Ed25519SignatureProvider {
    keys: RwLock<HashMap<IdentityId, SigningKey>>,
}

impl Ed25519SignatureProvider {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a key for `validator`, replacing any existing one.
    /// Returns the public key to store in the registry.
    pub fn generate_key(&self, validator: &IdentityId) -> PublicKeyRef {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        self.install(validator, signing_key)
    }

    /// Install a key from a 32-byte seed
    pub fn insert_seed(&self, validator: &IdentityId, seed: [u8; 32]) -> PublicKeyRef {
        self.install(validator, SigningKey::from_bytes(&seed))
    }

    fn install(&self, validator: &IdentityId, signing_key: SigningKey) -> PublicKeyRef {
        let public_key = signing_key.verifying_key().to_bytes().to_vec();
        self.keys.write().insert(validator.clone(), signing_key);
        public_key
    }

    pub fn remove_key(&self, validator: &IdentityId) -> bool {
        self.keys.write().remove(validator).is_some()
    }

    pub fn has_key(&self, validator: &IdentityId) -> bool {
        self.keys.read().contains_key(validator)
    }

    /// Public key of the local key for `validator`, if any
    pub fn public_key(&self, validator: &IdentityId) -> Option<PublicKeyRef> {
        self.keys
            .read()
            .get(validator)
            .map(|key| key.verifying_key().to_bytes().to_vec())
    }

    /// Secret seeds of every local key, ordered by identity
    pub fn export_seeds(&self) -> Vec<(IdentityId, [u8; 32])> {
        let mut seeds: Vec<(IdentityId, [u8; 32])> = self
            .keys
            .read()
            .iter()
            .map(|(id, key)| (id.clone(), key.to_bytes()))
            .collect();
        seeds.sort_by(|a, b| a.0.cmp(&b.0));
        seeds
    }

    /// Install exported seeds, replacing keys for the same identities
    pub fn import_seeds<I>(&self, seeds: I) -> usize
    where
        I: IntoIterator<Item = (IdentityId, [u8; 32])>,
    {
        let mut keys = self.keys.write();
        let mut imported = 0;
        for (validator, seed) in seeds {
            keys.insert(validator, SigningKey::from_bytes(&seed));
            imported += 1;
        }
        imported
    }

    pub fn key_count(&self) -> usize {
        self.keys.read().len()
    }
}

impl Default for Ed25519SignatureProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignatureProvider for Ed25519SignatureProvider {
    async fn sign(&self, validator: &IdentityId, message: &[u8]) -> Result<SignatureRef, SignerError> {
        let keys = self.keys.read();
        let signing_key = keys.get(validator).ok_or_else(|| SignerError::KeyUnavailable {
            validator: validator.clone(),
        })?;
        Ok(signing_key.sign(message).to_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let Ok(key_bytes) = <[u8; 32]>::try_from(public_key) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        verifying_key.verify(message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_and_verify() {
        let provider = Ed25519SignatureProvider::new();
        let alice = IdentityId::from("alice");
        let public_key = provider.generate_key(&alice);

        let signature = provider.sign(&alice, b"block").await.unwrap();
        assert_eq!(signature.len(), 64);
        assert!(provider.verify(&public_key, b"block", &signature));
        assert!(!provider.verify(&public_key, b"other block", &signature));
    }

    #[tokio::test]
    async fn test_unknown_key() {
        let provider = Ed25519SignatureProvider::new();
        let result = provider.sign(&IdentityId::from("bob"), b"block").await;
        assert!(matches!(result, Err(SignerError::KeyUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_seeded_keys_are_deterministic() {
        let provider = Ed25519SignatureProvider::new();
        let a = provider.insert_seed(&IdentityId::from("a"), [7u8; 32]);
        let b = provider.insert_seed(&IdentityId::from("b"), [7u8; 32]);
        assert_eq!(a, b);
        assert!(provider.remove_key(&IdentityId::from("a")));
        assert!(!provider.has_key(&IdentityId::from("a")));
    }

    #[test]
    fn test_malformed_inputs_do_not_verify() {
        let provider = Ed25519SignatureProvider::new();
        assert!(!provider.verify(&[1u8; 31], b"m", &[0u8; 64]));
        assert!(!provider.verify(&[1u8; 32], b"m", &[0u8; 10]));
    }

    #[tokio::test]
    async fn test_exported_seeds_sign_identically() {
        let original = Ed25519SignatureProvider::new();
        let alice = IdentityId::from("alice");
        let public_key = original.generate_key(&alice);
        original.generate_key(&IdentityId::from("bob"));

        let seeds = original.export_seeds();
        assert_eq!(seeds[0].0, alice);

        let restored = Ed25519SignatureProvider::new();
        assert_eq!(restored.import_seeds(seeds), 2);
        assert_eq!(restored.key_count(), 2);
        assert_eq!(restored.public_key(&alice), Some(public_key.clone()));

        let signature = restored.sign(&alice, b"block").await.unwrap();
        assert!(original.verify(&public_key, b"block", &signature));
    }
}
