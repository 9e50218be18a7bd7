//! # Validation Flow Tests
//!
//! Registry (cl-01) + eligibility and request engine (cl-03) + tiered
//! consensus (cl-02) working together.
//!
//! ```text
//! enroll / register ──→ [Registry + Geographic Index]
//!                                   │ lookup, active counts
//!                                   ↓
//! create ──→ [Validation Engine] ──eligibility──→ append ──→ evaluate_tiered
//!                                                              │
//!                                                  approved / rejected / pending
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cl_01_validator_registry::ValidatorRegistry;
    use cl_02_consensus::{ConsensusThresholds, FinalResult, TierThreshold};
    use cl_03_validation_requests::{
        IneligibilityReason, InMemoryEventSink, RequestStatus, ValidationConfig,
        ValidationDependencies, ValidationError, ValidationEvent, ValidationRequestEngine,
    };
    use shared_types::{
        GeoLevel, IdentityId, Location, ManualTimeSource, Role, Tier, ValidationLevel,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const START: u64 = 1_750_000_000;

    struct World {
        clock: Arc<ManualTimeSource>,
        registry: Arc<ValidatorRegistry>,
        events: Arc<InMemoryEventSink>,
        engine: ValidationRequestEngine,
    }

    fn create_world(config: ValidationConfig) -> World {
        let clock = Arc::new(ManualTimeSource::new(START));
        let registry = Arc::new(ValidatorRegistry::new(clock.clone()));
        let events = Arc::new(InMemoryEventSink::new());
        let engine = ValidationRequestEngine::new(ValidationDependencies {
            registry: registry.clone(),
            time_source: clock.clone(),
            events: events.clone(),
            config,
        })
        .unwrap();
        World {
            clock,
            registry,
            events,
            engine,
        }
    }

    fn seat(world: &World, id: &str, role: Role, location: Location) -> IdentityId {
        let identity = IdentityId::from(id);
        world
            .registry
            .register(identity.clone(), role, location, vec![0u8; 32])
            .unwrap();
        identity
    }

    fn city_a() -> Location {
        Location::new("CityA", "StateA", "CountryA")
    }

    fn city_b() -> Location {
        Location::new("CityB", "StateA", "CountryA")
    }

    fn city_c() -> Location {
        Location::new("CityC", "StateC", "CountryA")
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    /// Standard level, requester in CityA/StateA/CountryA, 3 city + 2 state approvals
    #[test]
    fn test_standard_request_approved_with_city_and_state_quorum() {
        let world = create_world(ValidationConfig::default());
        let requester = IdentityId::from("requester");
        world.registry.enroll_member(requester.clone(), city_a()).unwrap();

        let city: Vec<_> = (1..=3)
            .map(|i| seat(&world, &format!("city{i}"), Role::Representative, city_a()))
            .collect();
        let state: Vec<_> = (1..=2)
            .map(|i| seat(&world, &format!("state{i}"), Role::Senator, city_b()))
            .collect();

        let request = world
            .engine
            .create([0x42; 32], ValidationLevel::Standard, requester, vec![])
            .unwrap();

        for v in &city {
            world
                .engine
                .submit_validation(request.id, v, Tier::City, true, vec![1])
                .unwrap();
        }
        world
            .engine
            .submit_validation(request.id, &state[0], Tier::State, true, vec![1])
            .unwrap();
        let receipt = world
            .engine
            .submit_validation(request.id, &state[1], Tier::State, true, vec![1])
            .unwrap();

        assert!(receipt.consensus_reached);
        assert_eq!(receipt.final_result, Some(FinalResult::Approved));
        assert_eq!(
            world.engine.get_validation_status(request.id).unwrap().status,
            RequestStatus::Completed
        );
    }

    #[test]
    fn test_secure_request_needs_country_tier() {
        let world = create_world(ValidationConfig::default());
        let requester = IdentityId::from("requester");
        world.registry.enroll_member(requester.clone(), city_a()).unwrap();
        let city: Vec<_> = (0..3)
            .map(|i| seat(&world, &format!("c{i}"), Role::Representative, city_a()))
            .collect();
        let country: Vec<_> = (0..2)
            .map(|i| seat(&world, &format!("n{i}"), Role::Elder, city_c()))
            .collect();

        let request = world
            .engine
            .create([1; 32], ValidationLevel::Secure, requester, vec![])
            .unwrap();

        // City validators also sit in StateA
        for v in &city {
            world.engine.submit_validation(request.id, v, Tier::City, true, vec![]).unwrap();
        }
        for v in &city[..2] {
            world.engine.submit_validation(request.id, v, Tier::State, true, vec![]).unwrap();
        }
        assert!(world.engine.request(request.id).unwrap().is_pending());

        // StateC validators cannot vote on the state tier of a StateA request
        let denied = world
            .engine
            .submit_validation(request.id, &country[0], Tier::State, true, vec![]);
        assert!(matches!(
            denied,
            Err(ValidationError::NotEligible {
                reason: IneligibilityReason::LocationMismatch {
                    level: GeoLevel::State
                },
                ..
            })
        ));

        world.engine.submit_validation(request.id, &country[0], Tier::Country, false, vec![]).unwrap();
        let receipt = world
            .engine
            .submit_validation(request.id, &country[1], Tier::Country, true, vec![])
            .unwrap();

        // 6 of 7 approvals overall
        assert_eq!(receipt.final_result, Some(FinalResult::Approved));
    }

    #[test]
    fn test_maximum_request_with_relaxed_thresholds() {
        let one = TierThreshold::new(1, 51);
        let thresholds = ConsensusThresholds::default()
            .with_tier(Tier::City, one)
            .with_tier(Tier::State, one)
            .with_tier(Tier::Country, one)
            .with_tier(Tier::Role, one);
        let world = create_world(ValidationConfig {
            thresholds,
            ..ValidationConfig::default()
        });
        let founder = seat(&world, "founder", Role::Founder, city_a());
        let requester = IdentityId::from("requester");
        world.registry.enroll_member(requester.clone(), city_a()).unwrap();

        let request = world
            .engine
            .create([2; 32], ValidationLevel::Maximum, requester, vec![])
            .unwrap();

        // A founder in the requester's city can attest on every tier once
        let tiers = [Tier::Founder, Tier::City, Tier::State, Tier::Country, Tier::Role];
        let mut last = None;
        for tier in tiers {
            last = Some(
                world
                    .engine
                    .submit_validation(request.id, &founder, tier, true, vec![])
                    .unwrap(),
            );
        }
        let last = last.unwrap();
        assert!(last.consensus_reached);
        assert_eq!(last.final_result, Some(FinalResult::Approved));
        assert_eq!(world.registry.lookup(&founder).unwrap().validation_count, 5);
    }

    #[test]
    fn test_deactivated_validator_denied_until_reactivated() {
        let world = create_world(ValidationConfig::default());
        let requester = IdentityId::from("requester");
        world.registry.enroll_member(requester.clone(), city_a()).unwrap();
        let v = seat(&world, "v", Role::Senator, city_a());

        let request = world
            .engine
            .create([3; 32], ValidationLevel::Basic, requester, vec![])
            .unwrap();

        world.registry.deactivate(&v, "conflict of interest").unwrap();
        let denied = world
            .engine
            .submit_validation(request.id, &v, Tier::City, true, vec![]);
        assert!(matches!(
            denied,
            Err(ValidationError::NotEligible {
                reason: IneligibilityReason::InactiveValidator,
                ..
            })
        ));

        world.registry.reactivate(&v).unwrap();
        assert!(world
            .engine
            .submit_validation(request.id, &v, Tier::City, true, vec![])
            .is_ok());
    }

    #[test]
    fn test_relocation_changes_jurisdiction_for_new_requests_only() {
        let world = create_world(ValidationConfig::default());
        let requester = IdentityId::from("requester");
        world.registry.enroll_member(requester.clone(), city_a()).unwrap();
        let v = seat(&world, "v", Role::Representative, city_a());

        let before = world
            .engine
            .create([4; 32], ValidationLevel::Basic, requester.clone(), vec![])
            .unwrap();

        // Requester moves to CityB: earlier request keeps its snapshot
        world.registry.enroll_member(requester.clone(), city_b()).unwrap();
        let after = world
            .engine
            .create([5; 32], ValidationLevel::Basic, requester, vec![])
            .unwrap();

        assert!(world
            .engine
            .submit_validation(before.id, &v, Tier::City, true, vec![])
            .is_ok());
        assert!(world
            .engine
            .submit_validation(after.id, &v, Tier::City, true, vec![])
            .is_err());

        assert_eq!(world.registry.get_member_count(GeoLevel::City, "CityA"), 1);
        assert_eq!(world.registry.get_member_count(GeoLevel::City, "CityB"), 1);
        assert_eq!(world.registry.get_member_count(GeoLevel::State, "StateA"), 2);
    }

    #[test]
    fn test_expiry_window_and_audit_trail() {
        let world = create_world(ValidationConfig::default());
        let requester = IdentityId::from("requester");
        world.registry.enroll_member(requester.clone(), city_a()).unwrap();
        let v = seat(&world, "v", Role::Representative, city_a());

        let request = world
            .engine
            .create([6; 32], ValidationLevel::Basic, requester, vec![])
            .unwrap();
        world.engine.submit_validation(request.id, &v, Tier::City, true, vec![]).unwrap();

        world.clock.advance(48 * 3600 + 1);
        assert_eq!(world.engine.sweep_expired(), vec![request.id]);

        let trail = world.events.events_for(request.id);
        assert!(matches!(trail[0], ValidationEvent::RequestCreated { .. }));
        assert!(matches!(trail[1], ValidationEvent::RecordAccepted { approve: true, .. }));
        assert!(matches!(trail[2], ValidationEvent::RequestExpired { .. }));
        assert_eq!(trail.len(), 3);
    }

    #[test]
    fn test_parallel_requests_are_independent() {
        let world = create_world(ValidationConfig::default());
        let requester = IdentityId::from("requester");
        world.registry.enroll_member(requester.clone(), city_a()).unwrap();
        let validators: Vec<_> = (0..3)
            .map(|i| seat(&world, &format!("v{i}"), Role::Representative, city_a()))
            .collect();

        let requests: Vec<_> = (0..8u8)
            .map(|i| {
                world
                    .engine
                    .create([i; 32], ValidationLevel::Basic, requester.clone(), vec![])
                    .unwrap()
            })
            .collect();

        let engine = &world.engine;
        std::thread::scope(|scope| {
            for request in &requests {
                let validators = &validators;
                scope.spawn(move || {
                    for v in validators {
                        engine
                            .submit_validation(request.id, v, Tier::City, true, vec![])
                            .unwrap();
                    }
                });
            }
        });

        for request in &requests {
            let stored = world.engine.request(request.id).unwrap();
            assert_eq!(stored.status, RequestStatus::Completed);
            assert_eq!(stored.total_records(), 3);
        }
        for v in &validators {
            assert_eq!(world.registry.lookup(v).unwrap().validation_count, 8);
        }
    }
}
