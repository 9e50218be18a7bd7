//! # Node Lifecycle Tests
//!
//! Container wiring, snapshot persistence and restart behaviour, driven
//! through the public API and inbound event handler.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use node_runtime::adapters::{FileSnapshotStore, PersistenceStore};
    use node_runtime::{
        BlockCommitOutcome, CivicValidationApi, NodeConfig, NodeEvent, NodeEventHandler,
        SubsystemContainer,
    };
    use shared_types::{IdentityId, Location, ManualTimeSource, Role};
    use tokio::sync::{broadcast, watch};
    use uuid::Uuid;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const START: u64 = 1_800_000_000;

    fn try_boot(path: &Path, clock: Arc<ManualTimeSource>) -> Option<Arc<SubsystemContainer>> {
        let store: Arc<dyn PersistenceStore> = Arc::new(FileSnapshotStore::new(path));
        SubsystemContainer::with_dependencies(NodeConfig::default(), store, clock)
            .ok()
            .map(Arc::new)
    }

    fn boot(path: &Path, clock: Arc<ManualTimeSource>) -> Arc<SubsystemContainer> {
        try_boot(path, clock).expect("container boots")
    }

    fn city_a() -> Location {
        Location::new("CityA", "StateA", "CountryA")
    }

    fn request_id(payload: &serde_json::Value) -> Uuid {
        serde_json::from_value(payload["id"].clone()).unwrap()
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[test]
    fn test_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.snapshot");
        let clock = Arc::new(ManualTimeSource::new(START));

        let api = CivicValidationApi::new(boot(&path, clock.clone()));
        api.enroll_member("citizen", city_a());
        for name in ["a", "b", "c"] {
            assert!(api.register_validator(name, "representative", city_a(), None).success);
        }
        assert!(api.deactivate_validator("c", "on leave").success);
        let created = api.create_validation_request([7u8; 32], "basic", "citizen", vec![1, 2]);
        let id = request_id(&created.payload);
        assert!(api.submit_validation(id, "a", "city", true, vec![]).success);
        assert!(api.checkpoint().success);

        let restarted = CivicValidationApi::new(boot(&path, clock));
        let registry = &restarted.container().registry;
        assert_eq!(registry.validator_count(), 3);
        assert_eq!(registry.active_validators().len(), 2);
        assert!(!registry.lookup(&IdentityId::from("c")).unwrap().is_active());

        let status = restarted.get_validation_status(id);
        assert!(status.success);
        assert_eq!(status.payload["status"], "Pending");

        // Prior vote is still on record
        let again = restarted.submit_validation(id, "a", "city", true, vec![]);
        assert!(!again.success);
    }

    #[test]
    fn test_restored_request_expires_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.snapshot");
        let clock = Arc::new(ManualTimeSource::new(START));

        let container = boot(&path, clock.clone());
        container
            .registry
            .enroll_member(IdentityId::from("citizen"), city_a())
            .unwrap();
        let api = CivicValidationApi::new(container);
        let created = api.create_validation_request([8u8; 32], "standard", "citizen", vec![]);
        let id = request_id(&created.payload);
        api.checkpoint();
        drop(api);

        clock.advance(72 * 3600 + 1);
        let restarted = boot(&path, clock);
        assert_eq!(restarted.validation.sweep_expired(), vec![id]);
        assert!(restarted.validation.pending_requests().is_empty());
    }

    #[test]
    fn test_writes_survive_crash_without_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.snapshot");
        let clock = Arc::new(ManualTimeSource::new(START));

        let api = CivicValidationApi::new(boot(&path, clock.clone()));
        api.enroll_member("citizen", city_a());
        for name in ["a", "b", "c"] {
            assert!(api.register_validator(name, "elder", city_a(), None).success);
        }
        let created = api.create_validation_request([3u8; 32], "basic", "citizen", vec![]);
        let id = request_id(&created.payload);
        assert!(api.submit_validation(id, "b", "city", false, vec![]).success);
        // No checkpoint, no shutdown
        drop(api);

        let restarted = boot(&path, clock);
        assert_eq!(restarted.registry.validator_count(), 3);
        let request = restarted.validation.request(id).unwrap();
        assert_eq!(request.total_records(), 1);
        assert_eq!(
            restarted
                .registry
                .lookup(&IdentityId::from("b"))
                .unwrap()
                .validation_count,
            1
        );
    }

    #[tokio::test]
    async fn test_restart_then_commit_with_restored_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.snapshot");
        let clock = Arc::new(ManualTimeSource::new(START));

        let api = CivicValidationApi::new(boot(&path, clock.clone()));
        for name in ["a", "b", "c"] {
            assert!(api.register_validator(name, "founder", city_a(), None).success);
        }
        drop(api);

        let container = boot(&path, clock);
        assert_eq!(container.keystore.key_count(), 3);
        let api = CivicValidationApi::new(container);
        let proposed = api.propose_block(b"after restart".to_vec(), "a");
        assert!(proposed.success);
        let mut block_hash = [0u8; 32];
        block_hash.copy_from_slice(
            &hex::decode(proposed.payload["block_hash"].as_str().unwrap()).unwrap(),
        );

        let collected = api.collect_signatures(block_hash).await;
        assert_eq!(collected.payload["quorum_reached"].as_bool(), Some(true));
        assert!(api.commit_block(block_hash).success);
    }

    #[test]
    fn test_corrupted_snapshot_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.snapshot");
        std::fs::write(&path, b"definitely not a snapshot").unwrap();

        assert!(try_boot(&path, Arc::new(ManualTimeSource::new(START))).is_none());
    }

    #[test]
    fn test_missing_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let container = boot(
            &dir.path().join("absent.snapshot"),
            Arc::new(ManualTimeSource::new(START)),
        );
        assert_eq!(container.registry.validator_count(), 0);
        assert_eq!(container.validation.request_count(), 0);
    }

    #[tokio::test]
    async fn test_events_drive_enrollment_and_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.snapshot");
        let container = boot(&path, Arc::new(ManualTimeSource::new(START)));

        let (event_tx, event_rx) = broadcast::channel(32);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(NodeEventHandler::new(container.clone()).run(event_rx, shutdown_rx));

        for (name, role) in [
            ("founder", Role::Founder),
            ("elder", Role::Elder),
            ("senator", Role::Senator),
            ("resident", Role::Member),
        ] {
            event_tx
                .send(NodeEvent::UserRegistered {
                    identity: IdentityId::from(name),
                    role,
                    location: city_a(),
                    public_key: None,
                })
                .unwrap();
        }
        event_tx
            .send(NodeEvent::BlockNeedsCommit {
                producer: IdentityId::from("founder"),
                payload: b"charter".to_vec(),
            })
            .unwrap();
        drop(event_tx);
        task.await.unwrap();
        let _ = shutdown_tx.send(true);

        assert_eq!(container.registry.validator_count(), 3);
        let snapshot = container.checkpoint().unwrap();
        assert_eq!(snapshot.proposals.len(), 1);
        assert!(!snapshot.proposals[0].is_collecting());
    }

    #[tokio::test]
    async fn test_foreign_key_does_not_count_toward_quorum() {
        let dir = tempfile::tempdir().unwrap();
        let container = boot(
            &dir.path().join("node.snapshot"),
            Arc::new(ManualTimeSource::new(START)),
        );
        let handler = NodeEventHandler::new(container.clone());
        for name in ["v0", "v1", "v2"] {
            handler
                .on_user_registered(IdentityId::from(name), Role::Elder, city_a(), None)
                .unwrap();
        }
        container.keystore.remove_key(&IdentityId::from("v1"));
        container.keystore.remove_key(&IdentityId::from("v2"));

        let (_tx, rx) = watch::channel(false);
        let outcome = handler
            .on_block_needs_commit(IdentityId::from("v0"), b"entry".to_vec(), rx)
            .await
            .unwrap();
        let block_hash = match outcome {
            BlockCommitOutcome::Pending { proposal, report } => {
                assert_eq!(report.collected, 1);
                proposal.block_hash
            }
            other => panic!("expected pending, got {:?}", other),
        };

        // A key that does not match the registered public key is rejected
        container
            .keystore
            .insert_seed(&IdentityId::from("v1"), [1u8; 32]);
        let api = CivicValidationApi::new(container);
        let collected = api.collect_signatures(block_hash).await;
        assert_eq!(collected.payload["quorum_reached"].as_bool(), Some(false));
        assert!(!api.commit_block(block_hash).success);
    }
}
