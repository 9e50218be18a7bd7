//! # Block Commit Flow Tests
//!
//! PoA signature collection (cl-04) over the registry (cl-01), followed by
//! human validation (cl-03) of the committed block.
//!
//! ```text
//! propose_block ──→ collect_signatures (Ed25519, parallel) ──→ commit
//!                                                                │
//!                              create_validation_request(block_hash)
//!                                                                ↓
//!                                                   tiered validation result
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cl_01_validator_registry::ValidatorRegistry;
    use cl_02_consensus::{required_signatures, FinalResult};
    use cl_03_validation_requests::{
        NullEventSink, ValidationConfig, ValidationDependencies, ValidationRequestEngine,
    };
    use cl_04_block_commit::{
        BlockCommitCoordinator, CommitConfig, CommitDependencies, CommitError,
        Ed25519SignatureProvider, ProposalStatus, SignatureProvider,
    };
    use shared_types::{IdentityId, Location, ManualTimeSource, Role, Tier, ValidationLevel};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Chain {
        registry: Arc<ValidatorRegistry>,
        keystore: Arc<Ed25519SignatureProvider>,
        coordinator: BlockCommitCoordinator,
        engine: ValidationRequestEngine,
    }

    fn create_chain() -> Chain {
        let clock = Arc::new(ManualTimeSource::new(2_000_000));
        let registry = Arc::new(ValidatorRegistry::new(clock.clone()));
        let keystore = Arc::new(Ed25519SignatureProvider::new());
        let coordinator = BlockCommitCoordinator::new(CommitDependencies {
            registry: registry.clone(),
            signer: keystore.clone(),
            time_source: clock.clone(),
            config: CommitConfig::default(),
        });
        let engine = ValidationRequestEngine::new(ValidationDependencies {
            registry: registry.clone(),
            time_source: clock,
            events: Arc::new(NullEventSink),
            config: ValidationConfig::default(),
        })
        .unwrap();
        Chain {
            registry,
            keystore,
            coordinator,
            engine,
        }
    }

    fn seat_with_key(chain: &Chain, id: &str, role: Role) -> IdentityId {
        let identity = IdentityId::from(id);
        let public_key = chain.keystore.generate_key(&identity);
        chain
            .registry
            .register(
                identity.clone(),
                role,
                Location::new("CityA", "StateA", "CountryA"),
                public_key,
            )
            .unwrap();
        identity
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[tokio::test]
    async fn test_commit_then_validate_block() {
        let chain = create_chain();
        let validators: Vec<_> = (0..4)
            .map(|i| seat_with_key(&chain, &format!("v{i}"), Role::Representative))
            .collect();

        let proposal = chain
            .coordinator
            .propose_block(b"bylaw amendment 12".to_vec(), validators[0].clone())
            .unwrap();
        assert_eq!(proposal.quorum.required, required_signatures(4));

        let report = chain
            .coordinator
            .collect_signatures(proposal.block_hash)
            .await
            .unwrap();
        assert!(report.quorum_reached);

        let committed = chain.coordinator.commit(proposal.block_hash).unwrap();
        assert_eq!(committed.status, ProposalStatus::Committed);
        for signature in &committed.signatures {
            let validator = chain.registry.lookup(&signature.validator).unwrap();
            assert!(chain.keystore.verify(
                &validator.public_key_ref,
                &committed.block_hash,
                &signature.signature_ref
            ));
        }

        // Policy layer asks for human sign-off on the committed block
        let requester = IdentityId::from("citizen");
        chain
            .registry
            .enroll_member(requester.clone(), Location::new("CityA", "StateA", "CountryA"))
            .unwrap();
        let request = chain
            .engine
            .create(committed.block_hash, ValidationLevel::Basic, requester, vec![])
            .unwrap();
        let mut last = None;
        for v in &validators[..3] {
            last = Some(
                chain
                    .engine
                    .submit_validation(request.id, v, Tier::City, true, vec![])
                    .unwrap(),
            );
        }
        assert_eq!(last.unwrap().final_result, Some(FinalResult::Approved));
        assert_eq!(
            chain.engine.request(request.id).unwrap().target_block_hash,
            committed.block_hash
        );
    }

    #[tokio::test]
    async fn test_inactive_validators_are_not_asked() {
        let chain = create_chain();
        for i in 0..5 {
            seat_with_key(&chain, &format!("v{i}"), Role::Elder);
        }
        chain
            .registry
            .deactivate(&IdentityId::from("v4"), "retired")
            .unwrap();

        let proposal = chain
            .coordinator
            .propose_block(b"entry".to_vec(), IdentityId::from("v0"))
            .unwrap();
        assert_eq!(proposal.quorum.active_validators, 4);
        assert_eq!(proposal.quorum.required, 3);

        chain
            .coordinator
            .collect_signatures(proposal.block_hash)
            .await
            .unwrap();
        let stored = chain.coordinator.proposal(&proposal.block_hash).unwrap();
        assert!(stored
            .signatures
            .iter()
            .all(|s| s.validator != IdentityId::from("v4")));
    }

    #[tokio::test]
    async fn test_lost_keys_block_quorum() {
        let chain = create_chain();
        let validators: Vec<_> = (0..3)
            .map(|i| seat_with_key(&chain, &format!("v{i}"), Role::Senator))
            .collect();
        chain.keystore.remove_key(&validators[0]);
        chain.keystore.remove_key(&validators[1]);

        let proposal = chain
            .coordinator
            .propose_block(b"entry".to_vec(), validators[2].clone())
            .unwrap();
        let report = chain
            .coordinator
            .collect_signatures(proposal.block_hash)
            .await
            .unwrap();
        assert_eq!(report.collected, 1);
        assert_eq!(report.unavailable.len(), 2);

        assert_eq!(
            chain.coordinator.commit(proposal.block_hash),
            Err(CommitError::QuorumNotReached {
                collected: 1,
                required: 2
            })
        );
        assert!(chain
            .coordinator
            .proposal(&proposal.block_hash)
            .unwrap()
            .is_collecting());
    }

    #[tokio::test]
    async fn test_empty_validator_set_commits_trivially() {
        let chain = create_chain();
        let proposal = chain
            .coordinator
            .propose_block(b"genesis".to_vec(), IdentityId::from("bootstrap"))
            .unwrap();
        assert_eq!(proposal.quorum.required, 0);

        let report = chain
            .coordinator
            .collect_signatures(proposal.block_hash)
            .await
            .unwrap();
        assert!(report.quorum_reached);
        assert!(chain.coordinator.commit(proposal.block_hash).is_ok());
    }
}
