// ABOUTME: Tests for the pure delivery state machine.
// ABOUTME: Drives transition() input by input and checks phases, effects, and outcomes.

use super::state::{transition, Effect, Input, Outcome, Phase, RouterState, Step};
use crate::auth::AuthState;
use crate::carryover::CarryoverKey;
use crate::intent::{EventOrigin, ExternalEvent};
use crate::navigation::Route;
use crate::readiness::{ReadinessFlag, ReadinessUpdate};

fn feed(state: RouterState, inputs: Vec<Input>) -> (RouterState, Vec<Effect>) {
    let mut state = state;
    let mut all = Vec::new();
    for input in inputs {
        let (next, effects) = transition(state, input);
        state = next;
        all.extend(effects);
    }
    (state, all)
}

fn intent(payload: &str) -> (ExternalEvent, Input) {
    let event = ExternalEvent::from_intent(payload);
    (event.clone(), Input::IntentArrived(event))
}

fn ready_flags() -> Input {
    Input::Readiness(ReadinessUpdate {
        resources_loaded: Some(true),
        auth_checked: None,
        data_layer_ready: Some(true),
        navigation_ready: Some(true),
    })
}

#[test]
fn test_intent_starts_gating_and_arms_timeout() {
    let (_, arrive) = intent("https://x.example/a");
    let (state, effects) = transition(RouterState::new(), arrive);

    assert_eq!(state.phase, Phase::Gating { cycle: 1 });
    assert_eq!(effects, vec![Effect::ArmTimeout { cycle: 1 }]);
    assert_eq!(state.queue.peek().unwrap().payload, "https://x.example/a");
}

#[test]
fn test_authenticated_fast_path() {
    let (event, arrive) = intent("https://x.example/a");
    let (state, effects) = feed(
        RouterState::new(),
        vec![arrive, ready_flags(), Input::AuthResolved(AuthState::Authenticated)],
    );

    assert!(effects.contains(&Effect::CancelTimeout { cycle: 1 }));
    assert!(effects.contains(&Effect::Navigate {
        cycle: 1,
        route: Route::Main
    }));
    assert!(state.queue.is_empty());
    assert!(matches!(
        state.phase,
        Phase::InFlight {
            step: Step::NavigatingMain,
            ..
        }
    ));

    let (state, effects) = transition(
        state,
        Input::NavigationFinished {
            cycle: 1,
            route: Route::Main,
            result: Ok(()),
        },
    );
    assert_eq!(effects, vec![Effect::Settle { cycle: 1 }]);

    let (state, effects) = transition(state, Input::SettleElapsed { cycle: 1 });
    assert_eq!(
        effects,
        vec![
            Effect::Present {
                payload: "https://x.example/a".into()
            },
            Effect::Consume { event_id: event.id },
        ]
    );
    assert_eq!(state.phase, Phase::Idle);
    assert_eq!(
        state.last_outcome,
        Some(Outcome::Delivered {
            payload: "https://x.example/a".into()
        })
    );
}

#[test]
fn test_routing_decision_independent_of_signal_order() {
    let signals = vec![
        Input::Readiness(ReadinessUpdate::set(ReadinessFlag::ResourcesLoaded)),
        Input::Readiness(ReadinessUpdate::set(ReadinessFlag::DataLayerReady)),
        Input::Readiness(ReadinessUpdate::set(ReadinessFlag::NavigationReady)),
        Input::AuthResolved(AuthState::Authenticated),
    ];

    // Every rotation and its reverse
    for shift in 0..signals.len() {
        for reverse in [false, true] {
            let mut order = signals.clone();
            order.rotate_left(shift);
            if reverse {
                order.reverse();
            }

            let (_, arrive) = intent("https://x.example/a");
            let mut inputs = vec![arrive];
            inputs.extend(order.clone());
            let (state, effects) = feed(RouterState::new(), inputs);

            let navigations: Vec<_> = effects
                .iter()
                .filter(|e| matches!(e, Effect::Navigate { .. }))
                .collect();
            assert_eq!(
                navigations,
                vec![&Effect::Navigate {
                    cycle: 1,
                    route: Route::Main
                }],
                "order {:?}",
                order
            );
            assert!(state.readiness.is_ready());
        }
    }
}

#[test]
fn test_not_routed_until_auth_known() {
    let (_, arrive) = intent("https://x.example/a");
    let (state, effects) = feed(
        RouterState::new(),
        vec![arrive, Input::Readiness(ReadinessUpdate::all())],
    );
    assert_eq!(state.phase, Phase::Gating { cycle: 1 });
    assert_eq!(effects, vec![Effect::ArmTimeout { cycle: 1 }]);
}

#[test]
fn test_newer_intent_overwrites_queued_one() {
    let (first, arrive_a) = intent("https://x.example/a");
    let (_, arrive_b) = intent("https://x.example/b");
    let (state, effects) = feed(RouterState::new(), vec![arrive_a, arrive_b]);

    assert_eq!(state.queue.peek().unwrap().payload, "https://x.example/b");
    assert_eq!(state.phase, Phase::Gating { cycle: 1 });
    assert!(effects.contains(&Effect::Consume { event_id: first.id }));

    let (state, _) = feed(
        state,
        vec![ready_flags(), Input::AuthResolved(AuthState::Authenticated)],
    );
    match state.phase {
        Phase::InFlight { event, .. } => assert_eq!(event.payload, "https://x.example/b"),
        other => panic!("Expected InFlight, got {:?}", other),
    }
}

#[test]
fn test_unauthenticated_detour_and_resume() {
    let (event, arrive) = intent("https://x.example/b");
    let (state, effects) = feed(
        RouterState::new(),
        vec![arrive, Input::AuthResolved(AuthState::Unauthenticated), ready_flags()],
    );
    assert!(effects.contains(&Effect::Persist {
        cycle: 1,
        key: CarryoverKey::PendingSharedLink,
        payload: "https://x.example/b".into(),
    }));
    assert!(!effects.iter().any(|e| matches!(e, Effect::Present { .. })));
    assert!(state.queue.is_empty());

    let (state, effects) = transition(
        state,
        Input::CarryoverPersisted {
            cycle: 1,
            result: Ok(()),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Navigate {
            cycle: 1,
            route: Route::AuthEntry
        }]
    );

    let (state, effects) = transition(
        state,
        Input::NavigationFinished {
            cycle: 1,
            route: Route::AuthEntry,
            result: Ok(()),
        },
    );
    assert_eq!(effects, vec![Effect::Consume { event_id: event.id }]);
    assert_eq!(state.phase, Phase::Idle);
    assert!(matches!(state.last_outcome, Some(Outcome::AwaitingAuth { .. })));

    // Sign-in completes
    let (state, effects) = transition(state, Input::AuthFlowSucceeded);
    assert_eq!(state.auth, AuthState::Authenticated);
    assert_eq!(
        effects,
        vec![
            Effect::Take {
                key: CarryoverKey::PendingSharedLink
            },
            Effect::Take {
                key: CarryoverKey::ImmediateShareLink
            },
        ]
    );

    let (state, effects) = transition(
        state,
        Input::CarryoverTaken {
            key: CarryoverKey::PendingSharedLink,
            result: Ok(Some("https://x.example/b".into())),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::ArmTimeout { cycle: 2 },
            Effect::CancelTimeout { cycle: 2 },
            Effect::Navigate {
                cycle: 2,
                route: Route::Main
            },
        ]
    );

    let (state, effects) = feed(
        state,
        vec![
            Input::NavigationFinished {
                cycle: 2,
                route: Route::Main,
                result: Ok(()),
            },
            Input::SettleElapsed { cycle: 2 },
        ],
    );
    // Recovered payloads have no OS intent to consume
    assert_eq!(
        effects,
        vec![
            Effect::Settle { cycle: 2 },
            Effect::Present {
                payload: "https://x.example/b".into()
            },
        ]
    );
    assert_eq!(
        state.last_outcome,
        Some(Outcome::Delivered {
            payload: "https://x.example/b".into()
        })
    );
}

#[test]
fn test_timeout_forces_route_when_minimally_ready() {
    let (_, arrive) = intent("https://x.example/c");
    let (state, _) = feed(
        RouterState::new(),
        vec![
            arrive,
            Input::Readiness(ReadinessUpdate::set(ReadinessFlag::ResourcesLoaded)),
            Input::AuthResolved(AuthState::Authenticated),
        ],
    );
    assert_eq!(state.phase, Phase::Gating { cycle: 1 });

    let (state, effects) = transition(state, Input::TimeoutElapsed { cycle: 1 });
    assert!(effects.contains(&Effect::Navigate {
        cycle: 1,
        route: Route::Main
    }));
    assert!(matches!(state.phase, Phase::InFlight { .. }));
}

#[test]
fn test_forced_route_with_unknown_auth_detours() {
    let (_, arrive) = intent("https://x.example/c");
    let (state, effects) = feed(
        RouterState::new(),
        vec![
            arrive,
            Input::Readiness(ReadinessUpdate {
                resources_loaded: Some(true),
                auth_checked: Some(true),
                ..Default::default()
            }),
            Input::TimeoutElapsed { cycle: 1 },
        ],
    );
    assert_eq!(state.auth, AuthState::Unknown);
    assert!(effects.contains(&Effect::Persist {
        cycle: 1,
        key: CarryoverKey::PendingSharedLink,
        payload: "https://x.example/c".into(),
    }));
}

#[test]
fn test_timeout_discards_without_minimal_readiness() {
    let (event, arrive) = intent("https://x.example/d");
    let (state, effects) = feed(
        RouterState::new(),
        vec![arrive, Input::TimeoutElapsed { cycle: 1 }],
    );
    assert_eq!(
        effects,
        vec![
            Effect::ArmTimeout { cycle: 1 },
            Effect::Consume { event_id: event.id },
        ]
    );
    assert_eq!(state.phase, Phase::Idle);
    assert!(state.queue.is_empty());
    assert_eq!(
        state.last_outcome,
        Some(Outcome::Discarded {
            payload: "https://x.example/d".into()
        })
    );
}

#[test]
fn test_stale_inputs_ignored() {
    let (_, arrive) = intent("https://x.example/a");
    let (state, _) = feed(
        RouterState::new(),
        vec![arrive, ready_flags(), Input::AuthResolved(AuthState::Authenticated)],
    );

    // The guard for cycle 1 firing late, and results for a cycle that never ran
    let (state, effects) = feed(
        state,
        vec![
            Input::TimeoutElapsed { cycle: 1 },
            Input::SettleElapsed { cycle: 1 },
            Input::NavigationFinished {
                cycle: 9,
                route: Route::Main,
                result: Ok(()),
            },
            Input::CarryoverPersisted {
                cycle: 1,
                result: Ok(()),
            },
        ],
    );
    assert!(effects.is_empty());
    assert!(matches!(
        state.phase,
        Phase::InFlight {
            step: Step::NavigatingMain,
            ..
        }
    ));
}

#[test]
fn test_delivery_is_idempotent() {
    let (_, arrive) = intent("https://x.example/a");
    let (state, _) = feed(
        RouterState::new(),
        vec![
            arrive,
            ready_flags(),
            Input::AuthResolved(AuthState::Authenticated),
            Input::NavigationFinished {
                cycle: 1,
                route: Route::Main,
                result: Ok(()),
            },
            Input::SettleElapsed { cycle: 1 },
        ],
    );
    assert_eq!(state.phase, Phase::Idle);

    let (_, effects) = transition(state, Input::SettleElapsed { cycle: 1 });
    assert!(effects.is_empty());
}

#[test]
fn test_arrival_in_flight_waits_for_next_cycle() {
    let (_, arrive_a) = intent("https://x.example/a");
    let (_, arrive_b) = intent("https://x.example/b");
    let (state, effects) = feed(
        RouterState::new(),
        vec![
            arrive_a,
            ready_flags(),
            Input::AuthResolved(AuthState::Authenticated),
            arrive_b,
        ],
    );
    // Only one routing attempt so far
    assert_eq!(
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Navigate { .. }))
            .count(),
        1
    );
    assert_eq!(state.queue.peek().unwrap().payload, "https://x.example/b");

    let (state, effects) = feed(
        state,
        vec![
            Input::NavigationFinished {
                cycle: 1,
                route: Route::Main,
                result: Ok(()),
            },
            Input::SettleElapsed { cycle: 1 },
        ],
    );
    assert!(effects.contains(&Effect::ArmTimeout { cycle: 2 }));
    assert!(effects.contains(&Effect::Navigate {
        cycle: 2,
        route: Route::Main
    }));
    match state.phase {
        Phase::InFlight { cycle, event, .. } => {
            assert_eq!(cycle, 2);
            assert_eq!(event.payload, "https://x.example/b");
        }
        other => panic!("Expected InFlight, got {:?}", other),
    }
}

#[test]
fn test_navigation_failure_falls_back_then_loses_event() {
    let (event, arrive) = intent("https://x.example/a");
    let (state, effects) = feed(
        RouterState::new(),
        vec![
            arrive,
            ready_flags(),
            Input::AuthResolved(AuthState::Authenticated),
            Input::NavigationFinished {
                cycle: 1,
                route: Route::Main,
                result: Err("boom".into()),
            },
        ],
    );
    assert_eq!(
        effects.last(),
        Some(&Effect::Navigate {
            cycle: 1,
            route: Route::Root
        })
    );

    let (state, effects) = transition(
        state,
        Input::NavigationFinished {
            cycle: 1,
            route: Route::Root,
            result: Ok(()),
        },
    );
    assert_eq!(effects, vec![Effect::Consume { event_id: event.id }]);
    assert!(matches!(state.last_outcome, Some(Outcome::Lost { .. })));
    assert_eq!(state.phase, Phase::Idle);
}

#[test]
fn test_auth_navigation_failure_still_awaits_auth() {
    let (_, arrive) = intent("https://x.example/b");
    let (state, _) = feed(
        RouterState::new(),
        vec![
            arrive,
            ready_flags(),
            Input::AuthResolved(AuthState::Unauthenticated),
            Input::CarryoverPersisted {
                cycle: 1,
                result: Ok(()),
            },
            Input::NavigationFinished {
                cycle: 1,
                route: Route::AuthEntry,
                result: Err("not mounted".into()),
            },
            Input::NavigationFinished {
                cycle: 1,
                route: Route::Root,
                result: Err("still not mounted".into()),
            },
        ],
    );
    assert!(matches!(state.last_outcome, Some(Outcome::AwaitingAuth { .. })));
    assert_eq!(state.phase, Phase::Idle);
}

#[test]
fn test_persist_failure_loses_event() {
    let (event, arrive) = intent("https://x.example/b");
    let (state, effects) = feed(
        RouterState::new(),
        vec![
            arrive,
            ready_flags(),
            Input::AuthResolved(AuthState::Unauthenticated),
            Input::CarryoverPersisted {
                cycle: 1,
                result: Err("disk full".into()),
            },
        ],
    );
    assert!(effects.contains(&Effect::Consume { event_id: event.id }));
    assert!(!effects.iter().any(|e| matches!(
        e,
        Effect::Navigate {
            route: Route::AuthEntry,
            ..
        }
    )));
    match state.last_outcome {
        Some(Outcome::Lost { reason, .. }) => assert_eq!(reason, "disk full"),
        other => panic!("Expected Lost, got {:?}", other),
    }
}

#[test]
fn test_handoff_checked_once_when_ready_and_authenticated() {
    let (state, effects) = feed(
        RouterState::new(),
        vec![ready_flags(), Input::AuthResolved(AuthState::Authenticated)],
    );
    assert_eq!(
        effects,
        vec![Effect::Take {
            key: CarryoverKey::ImmediateShareLink
        }]
    );

    let (state, effects) = transition(state, Input::Readiness(ReadinessUpdate::all()));
    assert!(effects.is_empty());

    // A recovered immediate handoff is delivered like any other event
    let (_, effects) = transition(
        state,
        Input::CarryoverTaken {
            key: CarryoverKey::ImmediateShareLink,
            result: Ok(Some("https://x.example/i".into())),
        },
    );
    assert!(effects.contains(&Effect::Navigate {
        cycle: 1,
        route: Route::Main
    }));
}

#[test]
fn test_carryover_take_failure_is_absorbed() {
    let (state, effects) = transition(
        RouterState::new(),
        Input::CarryoverTaken {
            key: CarryoverKey::PendingSharedLink,
            result: Err("read failed".into()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase, Phase::Idle);
    assert!(state.last_outcome.is_none());
}

#[test]
fn test_repeated_auth_resolution_ignored() {
    let (state, _) = transition(
        RouterState::new(),
        Input::AuthResolved(AuthState::Unauthenticated),
    );
    let (state, effects) = transition(state, Input::AuthResolved(AuthState::Authenticated));
    assert!(effects.is_empty());
    assert_eq!(state.auth, AuthState::Unauthenticated);
}

#[test]
fn test_carryover_event_superseding_intent_consumes_it() {
    let (event, arrive) = intent("https://x.example/a");
    let (state, _) = transition(RouterState::new(), arrive);

    let (state, effects) = transition(
        state,
        Input::CarryoverTaken {
            key: CarryoverKey::PendingSharedLink,
            result: Ok(Some("https://x.example/p".into())),
        },
    );
    assert_eq!(effects, vec![Effect::Consume { event_id: event.id }]);
    let queued = state.queue.peek().unwrap();
    assert_eq!(queued.payload, "https://x.example/p");
    assert_eq!(
        queued.origin,
        EventOrigin::Carryover(CarryoverKey::PendingSharedLink)
    );
}

#[test]
fn test_unauthenticated_detour_needs_no_other_readiness() {
    let (_, arrive) = intent("https://x.example/b");
    let (state, effects) = feed(
        RouterState::new(),
        vec![arrive, Input::AuthResolved(AuthState::Unauthenticated)],
    );

    assert!(!state.readiness.is_ready());
    assert_eq!(
        effects,
        vec![
            Effect::ArmTimeout { cycle: 1 },
            Effect::CancelTimeout { cycle: 1 },
            Effect::Persist {
                cycle: 1,
                key: CarryoverKey::PendingSharedLink,
                payload: "https://x.example/b".into(),
            },
        ]
    );
    assert!(state.queue.is_empty());
}

#[test]
fn test_authenticated_route_still_waits_for_readiness() {
    let (_, arrive) = intent("https://x.example/a");
    let (state, effects) = feed(
        RouterState::new(),
        vec![arrive, Input::AuthResolved(AuthState::Authenticated)],
    );
    assert_eq!(state.phase, Phase::Gating { cycle: 1 });
    assert_eq!(effects, vec![Effect::ArmTimeout { cycle: 1 }]);
}

/// Detour for `payload`, then sign-in completes with the app fully ready.
fn parked_then_signed_in(payload: &str) -> (RouterState, Vec<Effect>) {
    let (_, arrive) = intent(payload);
    feed(
        RouterState::new(),
        vec![
            arrive,
            ready_flags(),
            Input::AuthResolved(AuthState::Unauthenticated),
            Input::CarryoverPersisted {
                cycle: 1,
                result: Ok(()),
            },
            Input::NavigationFinished {
                cycle: 1,
                route: Route::AuthEntry,
                result: Ok(()),
            },
            Input::AuthFlowSucceeded,
        ],
    )
}

#[test]
fn test_same_link_from_both_carryover_slots_routed_once() {
    let (state, _) = parked_then_signed_in("https://x.example/b");

    let (state, effects) = feed(
        state,
        vec![
            Input::CarryoverTaken {
                key: CarryoverKey::PendingSharedLink,
                result: Ok(Some("https://x.example/b".into())),
            },
            Input::CarryoverTaken {
                key: CarryoverKey::ImmediateShareLink,
                result: Ok(Some("https://x.example/b".into())),
            },
        ],
    );
    assert_eq!(
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Navigate { .. }))
            .count(),
        1
    );
    assert!(state.queue.is_empty());
    assert_eq!(state.active_cycle(), Some(2));
}

#[test]
fn test_late_duplicate_after_delivery_dropped() {
    let (state, _) = parked_then_signed_in("https://x.example/b");

    let (state, _) = feed(
        state,
        vec![
            Input::CarryoverTaken {
                key: CarryoverKey::ImmediateShareLink,
                result: Ok(Some("https://x.example/b".into())),
            },
            Input::NavigationFinished {
                cycle: 2,
                route: Route::Main,
                result: Ok(()),
            },
            Input::SettleElapsed { cycle: 2 },
        ],
    );
    assert!(matches!(state.last_outcome, Some(Outcome::Delivered { .. })));

    let (state, effects) = transition(
        state,
        Input::CarryoverTaken {
            key: CarryoverKey::PendingSharedLink,
            result: Ok(Some("https://x.example/b".into())),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase, Phase::Idle);
}

#[test]
fn test_different_carryover_link_still_admitted() {
    let (state, _) = parked_then_signed_in("https://x.example/b");

    let (state, _) = transition(
        state,
        Input::CarryoverTaken {
            key: CarryoverKey::PendingSharedLink,
            result: Ok(Some("https://x.example/b".into())),
        },
    );
    let (state, _) = transition(
        state,
        Input::CarryoverTaken {
            key: CarryoverKey::ImmediateShareLink,
            result: Ok(Some("https://x.example/other".into())),
        },
    );
    assert_eq!(state.queue.peek().unwrap().payload, "https://x.example/other");
}

#[test]
fn test_auth_flow_during_detour_defers_pending_take() {
    let (event, arrive) = intent("https://x.example/b");
    let (state, _) = feed(
        RouterState::new(),
        vec![arrive, Input::AuthResolved(AuthState::Unauthenticated)],
    );
    assert!(matches!(
        state.phase,
        Phase::InFlight {
            step: Step::Persisting,
            ..
        }
    ));

    let (state, effects) = transition(state, Input::AuthFlowSucceeded);
    assert!(!effects.contains(&Effect::Take {
        key: CarryoverKey::PendingSharedLink
    }));
    assert_eq!(state.auth, AuthState::Authenticated);

    let (state, effects) = feed(
        state,
        vec![
            Input::CarryoverPersisted {
                cycle: 1,
                result: Ok(()),
            },
            Input::NavigationFinished {
                cycle: 1,
                route: Route::AuthEntry,
                result: Ok(()),
            },
        ],
    );
    assert_eq!(
        effects,
        vec![
            Effect::Navigate {
                cycle: 1,
                route: Route::AuthEntry
            },
            Effect::Consume { event_id: event.id },
            Effect::Take {
                key: CarryoverKey::PendingSharedLink
            },
        ]
    );
    assert_eq!(state.phase, Phase::Idle);

    // The deferred take fires once
    let (_, effects) = transition(
        state,
        Input::CarryoverTaken {
            key: CarryoverKey::PendingSharedLink,
            result: Ok(None),
        },
    );
    assert!(effects.is_empty());
}
