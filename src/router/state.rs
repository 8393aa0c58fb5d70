// ABOUTME: Pure delivery state machine: transition(state, input) -> (state, effects).
// ABOUTME: Side effects are returned as data; their results come back as new inputs.

use uuid::Uuid;

use crate::auth::AuthState;
use crate::carryover::CarryoverKey;
use crate::intent::{EventOrigin, EventQueue, ExternalEvent};
use crate::navigation::Route;
use crate::readiness::{ReadinessFlag, ReadinessState, ReadinessTracker, ReadinessUpdate};

/// A signal the state machine reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A share intent (or recovered carryover payload) arrived.
    IntentArrived(ExternalEvent),
    /// One or more readiness flags changed.
    Readiness(ReadinessUpdate),
    /// The auth resolver finished.
    AuthResolved(AuthState),
    /// The timeout guard for `cycle` fired.
    TimeoutElapsed { cycle: u64 },
    /// The sign-in/sign-up flow completed successfully.
    AuthFlowSucceeded,
    /// A carryover take completed.
    CarryoverTaken {
        key: CarryoverKey,
        result: Result<Option<String>, String>,
    },
    /// The carryover write for `cycle` completed.
    CarryoverPersisted {
        cycle: u64,
        result: Result<(), String>,
    },
    /// A navigation issued for `cycle` completed.
    NavigationFinished {
        cycle: u64,
        route: Route,
        result: Result<(), String>,
    },
    /// The post-navigation settle delay for `cycle` elapsed.
    SettleElapsed { cycle: u64 },
}

/// Work the executor performs after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ArmTimeout { cycle: u64 },
    CancelTimeout { cycle: u64 },
    Navigate { cycle: u64, route: Route },
    Settle { cycle: u64 },
    Persist {
        cycle: u64,
        key: CarryoverKey,
        payload: String,
    },
    Take { key: CarryoverKey },
    Present { payload: String },
    /// Tell the OS intent source this event is finished with.
    Consume { event_id: Uuid },
}

/// Where an in-flight event is in its route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    NavigatingMain,
    Settling,
    Persisting,
    NavigatingAuth,
    /// Navigating to the root after navigation to `after` failed.
    FallingBack { after: Route },
}

/// Router phase. The queued event itself lives in [`RouterState::queue`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// An event is queued and waiting on readiness and auth.
    Gating { cycle: u64 },
    /// An event has been routed and its side effects are running.
    InFlight {
        cycle: u64,
        event: ExternalEvent,
        step: Step,
    },
}

/// Terminal result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Surfaced to the presentation layer.
    Delivered { payload: String },
    /// Parked in carryover storage while the user signs in.
    AwaitingAuth { payload: String },
    /// Dropped by the timeout guard without enough readiness to route.
    Discarded { payload: String },
    /// Dropped after a storage or navigation failure.
    Lost { payload: String, reason: String },
}

/// Complete router state for one coordinator lifetime.
#[derive(Debug, Clone, Default)]
pub struct RouterState {
    pub phase: Phase,
    /// Single-slot queue. While an event is in flight this holds the next one.
    pub queue: EventQueue,
    pub readiness: ReadinessTracker,
    pub auth: AuthState,
    pub last_outcome: Option<Outcome>,
    next_cycle: u64,
    handoff_checked: bool,
    /// Sign-in finished while a detour was still parking its payload.
    resume_after_detour: bool,
}

/// Apply one input, returning the next state and the effects to run.
pub fn transition(mut state: RouterState, input: Input) -> (RouterState, Vec<Effect>) {
    let mut effects = Vec::new();
    state.apply(input, &mut effects);
    (state, effects)
}

impl RouterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cycle currently gating or in flight.
    pub fn active_cycle(&self) -> Option<u64> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Gating { cycle } | Phase::InFlight { cycle, .. } => Some(*cycle),
        }
    }

    pub fn readiness_state(&self) -> ReadinessState {
        self.readiness.state()
    }

    fn apply(&mut self, input: Input, fx: &mut Vec<Effect>) {
        match input {
            Input::IntentArrived(event) => self.admit(event, fx),
            Input::Readiness(update) => {
                for flag in self.readiness.update(update) {
                    tracing::debug!(flag = %flag, "Readiness flag raised");
                }
                self.check_handoff(fx);
                self.evaluate(fx);
            }
            Input::AuthResolved(auth) => {
                if self.auth != AuthState::Unknown {
                    tracing::debug!(auth = %auth, "Ignoring repeated auth resolution");
                    return;
                }
                tracing::debug!(auth = %auth, "Auth resolved");
                self.auth = auth;
                self.readiness
                    .update(ReadinessUpdate::set(ReadinessFlag::AuthChecked));
                self.check_handoff(fx);
                self.evaluate(fx);
            }
            Input::AuthFlowSucceeded => {
                if self.auth != AuthState::Authenticated {
                    tracing::debug!(from = %self.auth, "Auth flow succeeded, session is now authenticated");
                }
                self.auth = AuthState::Authenticated;
                self.readiness
                    .update(ReadinessUpdate::set(ReadinessFlag::AuthChecked));
                if self.detour_in_flight() {
                    // The parked payload may not be written yet; take it when the cycle ends.
                    self.resume_after_detour = true;
                } else {
                    fx.push(Effect::Take {
                        key: CarryoverKey::PendingSharedLink,
                    });
                }
                self.check_handoff(fx);
                self.evaluate(fx);
            }
            Input::TimeoutElapsed { cycle } => self.on_timeout(cycle, fx),
            Input::CarryoverTaken { key, result } => match result {
                Ok(Some(payload)) if self.holds_payload(&payload) => {
                    tracing::debug!(key = %key, "Carryover payload already routed, dropping it");
                }
                Ok(Some(payload)) if !payload.trim().is_empty() => {
                    tracing::debug!(key = %key, "Recovered carryover payload");
                    self.admit(ExternalEvent::new(payload, EventOrigin::Carryover(key)), fx);
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(key = %key, error = %error, "Carryover take failed, payload lost");
                }
            },
            Input::CarryoverPersisted { cycle, result } => self.on_persisted(cycle, result, fx),
            Input::NavigationFinished {
                cycle,
                route,
                result,
            } => self.on_navigated(cycle, route, result, fx),
            Input::SettleElapsed { cycle } => self.on_settled(cycle, fx),
        }
    }

    /// Place an event in the single slot and start gating if idle.
    fn admit(&mut self, event: ExternalEvent, fx: &mut Vec<Effect>) {
        tracing::debug!(event_id = %event.id, origin = ?event.origin, "Event queued");
        if let Some(superseded) = self.queue.put(event) {
            tracing::debug!(event_id = %superseded.id, "Queued event superseded by newer share");
            if superseded.needs_consume() {
                fx.push(Effect::Consume {
                    event_id: superseded.id,
                });
            }
        }
        if self.phase == Phase::Idle {
            self.start_gating(fx);
        } else {
            self.evaluate(fx);
        }
    }

    fn start_gating(&mut self, fx: &mut Vec<Effect>) {
        if self.queue.is_empty() {
            return;
        }
        self.next_cycle += 1;
        let cycle = self.next_cycle;
        self.phase = Phase::Gating { cycle };
        fx.push(Effect::ArmTimeout { cycle });
        self.evaluate(fx);
    }

    /// Route the queued event once readiness and auth allow it.
    fn evaluate(&mut self, fx: &mut Vec<Effect>) {
        let Phase::Gating { cycle } = self.phase else {
            return;
        };
        match self.auth {
            // Parking for sign-in does not wait on the other readiness flags.
            AuthState::Unauthenticated => self.route(cycle, AuthState::Unauthenticated, fx),
            AuthState::Authenticated if self.readiness.is_ready() => {
                self.route(cycle, AuthState::Authenticated, fx)
            }
            _ => {}
        }
    }

    fn route(&mut self, cycle: u64, auth: AuthState, fx: &mut Vec<Effect>) {
        let Some(event) = self.queue.take() else {
            self.phase = Phase::Idle;
            return;
        };
        fx.push(Effect::CancelTimeout { cycle });

        let step = if auth == AuthState::Authenticated {
            tracing::debug!(cycle, "Routing shared link to main view");
            fx.push(Effect::Navigate {
                cycle,
                route: Route::Main,
            });
            Step::NavigatingMain
        } else {
            tracing::debug!(cycle, "Routing shared link through sign-in");
            fx.push(Effect::Persist {
                cycle,
                key: CarryoverKey::PendingSharedLink,
                payload: event.payload.clone(),
            });
            Step::Persisting
        };
        self.phase = Phase::InFlight { cycle, event, step };
    }

    fn on_timeout(&mut self, cycle: u64, fx: &mut Vec<Effect>) {
        if self.phase != (Phase::Gating { cycle }) {
            return;
        }
        if self.readiness.is_minimally_ready() {
            let auth = self.auth.or_unauthenticated();
            tracing::info!(
                cycle,
                auth = %auth,
                missing = ?self.readiness.missing(),
                "Readiness timeout, forcing route"
            );
            self.route(cycle, auth, fx);
            return;
        }

        if let Some(event) = self.queue.take() {
            tracing::info!(
                cycle,
                missing = ?self.readiness.missing(),
                "Readiness timeout, discarding shared link"
            );
            self.finish(
                event.clone(),
                Outcome::Discarded {
                    payload: event.payload,
                },
                fx,
            );
        } else {
            self.phase = Phase::Idle;
        }
    }

    fn on_persisted(&mut self, cycle: u64, result: Result<(), String>, fx: &mut Vec<Effect>) {
        let Phase::InFlight {
            cycle: active,
            ref event,
            step: Step::Persisting,
        } = self.phase
        else {
            return;
        };
        if active != cycle {
            return;
        }
        let event = event.clone();
        match result {
            Ok(()) => {
                fx.push(Effect::Navigate {
                    cycle,
                    route: Route::AuthEntry,
                });
                self.phase = Phase::InFlight {
                    cycle,
                    event,
                    step: Step::NavigatingAuth,
                };
            }
            Err(reason) => {
                tracing::warn!(cycle, error = %reason, "Could not park shared link, dropping it");
                let payload = event.payload.clone();
                self.finish(event, Outcome::Lost { payload, reason }, fx);
            }
        }
    }

    fn on_navigated(
        &mut self,
        cycle: u64,
        route: Route,
        result: Result<(), String>,
        fx: &mut Vec<Effect>,
    ) {
        let Phase::InFlight {
            cycle: active,
            ref event,
            step,
        } = self.phase
        else {
            return;
        };
        if active != cycle {
            return;
        }
        let event = event.clone();

        match (step, route, result) {
            (Step::NavigatingMain, Route::Main, Ok(())) => {
                fx.push(Effect::Settle { cycle });
                self.phase = Phase::InFlight {
                    cycle,
                    event,
                    step: Step::Settling,
                };
            }
            (Step::NavigatingAuth, Route::AuthEntry, Ok(())) => {
                let payload = event.payload.clone();
                self.finish(event, Outcome::AwaitingAuth { payload }, fx);
            }
            (Step::NavigatingMain, Route::Main, Err(error))
            | (Step::NavigatingAuth, Route::AuthEntry, Err(error)) => {
                tracing::warn!(cycle, route = %route, error = %error, "Navigation failed, falling back to root");
                fx.push(Effect::Navigate {
                    cycle,
                    route: Route::Root,
                });
                self.phase = Phase::InFlight {
                    cycle,
                    event,
                    step: Step::FallingBack { after: route },
                };
            }
            (Step::FallingBack { after }, Route::Root, result) => {
                if let Err(error) = &result {
                    tracing::warn!(cycle, error = %error, "Fallback navigation failed");
                }
                let payload = event.payload.clone();
                let outcome = match after {
                    // The payload is already durable; sign-in can still pick it up.
                    Route::AuthEntry => Outcome::AwaitingAuth { payload },
                    _ => Outcome::Lost {
                        payload,
                        reason: format!("navigation to {} failed", after),
                    },
                };
                self.finish(event, outcome, fx);
            }
            _ => {}
        }
    }

    fn on_settled(&mut self, cycle: u64, fx: &mut Vec<Effect>) {
        let Phase::InFlight {
            cycle: active,
            ref event,
            step: Step::Settling,
        } = self.phase
        else {
            return;
        };
        if active != cycle {
            return;
        }
        let event = event.clone();
        let payload = event.payload.clone();
        fx.push(Effect::Present {
            payload: payload.clone(),
        });
        self.finish(event, Outcome::Delivered { payload }, fx);
    }

    /// End the current cycle and admit the next queued event, if any.
    fn finish(&mut self, event: ExternalEvent, outcome: Outcome, fx: &mut Vec<Effect>) {
        if event.needs_consume() {
            fx.push(Effect::Consume { event_id: event.id });
        }
        match &outcome {
            Outcome::Delivered { .. } => tracing::info!(event_id = %event.id, "Shared link delivered"),
            Outcome::AwaitingAuth { .. } => {
                tracing::info!(event_id = %event.id, "Shared link parked until sign-in completes")
            }
            Outcome::Discarded { .. } => tracing::info!(event_id = %event.id, "Shared link discarded"),
            Outcome::Lost { reason, .. } => {
                tracing::info!(event_id = %event.id, reason = %reason, "Shared link lost")
            }
        }
        self.last_outcome = Some(outcome);
        self.phase = Phase::Idle;
        if std::mem::take(&mut self.resume_after_detour) {
            fx.push(Effect::Take {
                key: CarryoverKey::PendingSharedLink,
            });
        }
        self.start_gating(fx);
    }

    /// True while a sign-in detour is parking its payload or navigating.
    fn detour_in_flight(&self) -> bool {
        matches!(
            self.phase,
            Phase::InFlight {
                step: Step::Persisting
                    | Step::NavigatingAuth
                    | Step::FallingBack {
                        after: Route::AuthEntry
                    },
                ..
            }
        )
    }

    /// True if `payload` is queued, in flight, or was the last delivery.
    fn holds_payload(&self, payload: &str) -> bool {
        let in_flight =
            matches!(&self.phase, Phase::InFlight { event, .. } if event.payload == payload);
        let queued = self.queue.peek().is_some_and(|event| event.payload == payload);
        let delivered = matches!(
            &self.last_outcome,
            Some(Outcome::Delivered { payload: last }) if last == payload
        );
        in_flight || queued || delivered
    }

    /// Pick up a same-session handoff the first time the app is ready and signed in.
    fn check_handoff(&mut self, fx: &mut Vec<Effect>) {
        if self.handoff_checked
            || self.auth != AuthState::Authenticated
            || !self.readiness.is_ready()
        {
            return;
        }
        self.handoff_checked = true;
        fx.push(Effect::Take {
            key: CarryoverKey::ImmediateShareLink,
        });
    }
}
