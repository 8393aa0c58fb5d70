// ABOUTME: Share coordinator - a single-task actor driving the delivery state machine.
// ABOUTME: Executes effects, re-injects their results as inputs, and exposes a handle to the host.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::guard::TimeoutGuard;
use super::state::{transition, Effect, Input, Outcome, Phase, RouterState};
use crate::auth::{AuthResolver, AuthState, CredentialStore};
use crate::carryover::{CarryoverStore, KeyValueStore};
use crate::config::RelayConfig;
use crate::error::{NavigationError, RelayError};
use crate::intent::{IntentListener, IntentSource};
use crate::navigation::{Navigator, Route};
use crate::presentation::{Presenter, SharePresentation};
use crate::readiness::{ReadinessState, ReadinessUpdate};

/// External collaborators for one coordinator lifetime.
///
/// Built once at app start and dropped at logout or exit; a new session
/// builds a new context so readiness and auth are resolved afresh.
#[derive(Clone)]
pub struct RelayContext {
    pub intents: Arc<dyn IntentSource>,
    pub store: Arc<dyn KeyValueStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub navigator: Arc<dyn Navigator>,
}

/// Coarse phase reported by [`StatusSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Idle,
    Gating,
    InFlight,
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub phase: PhaseKind,
    pub readiness: ReadinessState,
    pub auth: AuthState,
    /// Payload waiting in the queue slot.
    pub queued: Option<String>,
    /// Payload currently being routed.
    pub in_flight: Option<String>,
    pub last_outcome: Option<Outcome>,
    /// Whether the timeout guard is currently armed.
    pub timeout_armed: bool,
}

enum Command {
    Input(Input),
    PollIntents,
    Dismiss,
    Status(oneshot::Sender<StatusSnapshot>),
}

/// Host-facing handle to a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<Command>,
    presentation: watch::Receiver<SharePresentation>,
    carryover: CarryoverStore,
    task: Arc<std::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl CoordinatorHandle {
    /// Tell the coordinator the OS may have a new share intent.
    pub fn notify_intent(&self) -> Result<(), RelayError> {
        self.send(Command::PollIntents)
    }

    /// Merge readiness flags.
    pub fn update_readiness(&self, update: ReadinessUpdate) -> Result<(), RelayError> {
        self.send(Command::Input(Input::Readiness(update)))
    }

    /// Report that the sign-in/sign-up flow completed.
    pub fn auth_flow_succeeded(&self) -> Result<(), RelayError> {
        self.send(Command::Input(Input::AuthFlowSucceeded))
    }

    /// Hide the shared-link screen after the user closes it.
    pub fn dismiss(&self) -> Result<(), RelayError> {
        self.send(Command::Dismiss)
    }

    /// Subscribe to presentation updates.
    pub fn presentation(&self) -> watch::Receiver<SharePresentation> {
        self.presentation.clone()
    }

    /// Hand a link back from the auth flow for same-session pickup.
    ///
    /// The coordinator takes it the first time the app is ready and signed in.
    pub async fn stash_immediate(&self, payload: &str) -> Result<(), RelayError> {
        self.carryover.stash_immediate(payload).await?;
        Ok(())
    }

    /// Snapshot the coordinator state.
    pub async fn status(&self) -> Result<StatusSnapshot, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status(reply))?;
        rx.await.map_err(|_| RelayError::Closed)
    }

    /// Stop the coordinator. Armed timers are cancelled; in-flight reads are
    /// left to finish and their results dropped.
    pub async fn shutdown(&self) {
        let task = {
            let mut guard = self.task.lock().unwrap_or_else(|e| e.into_inner());
            guard.take()
        };
        if let Some(task) = task {
            task.abort();
            let _ = task.await;
        }
    }

    fn send(&self, command: Command) -> Result<(), RelayError> {
        self.tx.send(command).map_err(|_| RelayError::Closed)
    }
}

/// The actor owning the state machine and its side effects.
pub struct ShareCoordinator {
    config: Arc<RelayConfig>,
    context: RelayContext,
    state: RouterState,
    listener: IntentListener,
    resolver: Arc<AuthResolver>,
    carryover: CarryoverStore,
    presenter: Presenter,
    guard: TimeoutGuard,
    /// Weak so the actor stops once every handle is dropped.
    tx: mpsc::WeakUnboundedSender<Command>,
    rx: mpsc::UnboundedReceiver<Command>,
}

impl ShareCoordinator {
    /// Start a coordinator on the current tokio runtime.
    ///
    /// Auth resolution and a first intent poll (for cold-start shares)
    /// begin immediately.
    pub fn spawn(config: RelayConfig, context: RelayContext) -> CoordinatorHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (presenter, presentation) = Presenter::new();
        let carryover = CarryoverStore::new(context.store.clone());
        let resolver = Arc::new(AuthResolver::new(
            context.credentials.clone(),
            config.credential_key.clone(),
        ));

        let coordinator = ShareCoordinator {
            config: Arc::new(config),
            listener: IntentListener::new(context.intents.clone()),
            context,
            state: RouterState::new(),
            resolver,
            carryover: carryover.clone(),
            presenter,
            guard: TimeoutGuard::new(),
            tx: tx.downgrade(),
            rx,
        };
        let task = tokio::spawn(coordinator.run());

        CoordinatorHandle {
            tx,
            presentation,
            carryover,
            task: Arc::new(std::sync::Mutex::new(Some(task))),
        }
    }

    async fn run(mut self) {
        tracing::debug!(timeout = ?self.config.timeout, "Share coordinator started");
        self.resolve_auth();
        self.poll_intents();

        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Input(input) => self.dispatch(input),
                Command::PollIntents => self.poll_intents(),
                Command::Dismiss => self.presenter.hide(),
                Command::Status(reply) => {
                    let _ = reply.send(self.snapshot());
                }
            }
        }
        tracing::debug!("Share coordinator stopped");
    }

    fn dispatch(&mut self, input: Input) {
        let state = std::mem::take(&mut self.state);
        let (next, effects) = transition(state, input);
        self.state = next;
        for effect in effects {
            self.execute(effect);
        }
    }

    fn poll_intents(&mut self) {
        if let Some(event) = self.listener.poll() {
            self.dispatch(Input::IntentArrived(event));
        }
    }

    /// Sender for effect results, or `None` once every handle is gone.
    fn sender(&self) -> Option<mpsc::UnboundedSender<Command>> {
        self.tx.upgrade()
    }

    fn resolve_auth(&self) {
        let resolver = self.resolver.clone();
        let Some(tx) = self.sender() else {
            return;
        };
        tokio::spawn(async move {
            let auth = resolver.resolve().await;
            let _ = tx.send(Command::Input(Input::AuthResolved(auth)));
        });
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::CancelTimeout { cycle } => {
                self.guard.cancel(cycle);
            }
            Effect::Present { payload } => self.presenter.show(&payload),
            Effect::Consume { event_id } => {
                if !self.listener.consume(event_id) {
                    tracing::debug!(event_id = %event_id, "Event already consumed or superseded");
                }
            }
            effect => {
                let Some(tx) = self.sender() else {
                    tracing::debug!(effect = ?effect, "Dropping effect, coordinator is shutting down");
                    return;
                };
                self.spawn_effect(effect, tx);
            }
        }
    }

    /// Run an asynchronous effect; its result comes back as an [`Input`].
    fn spawn_effect(&mut self, effect: Effect, tx: mpsc::UnboundedSender<Command>) {
        match effect {
            Effect::ArmTimeout { cycle } => {
                self.guard.arm(cycle, self.config.timeout, move |cycle| {
                    let _ = tx.send(Command::Input(Input::TimeoutElapsed { cycle }));
                });
            }
            Effect::Navigate { cycle, route } => self.navigate(cycle, route, tx),
            Effect::Settle { cycle } => {
                let delay = self.config.settle_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Command::Input(Input::SettleElapsed { cycle }));
                });
            }
            Effect::Persist {
                cycle,
                key,
                payload,
            } => {
                let carryover = self.carryover.clone();
                tokio::spawn(async move {
                    let result = carryover
                        .put(key, &payload)
                        .await
                        .map_err(|e| e.to_string());
                    let _ = tx.send(Command::Input(Input::CarryoverPersisted { cycle, result }));
                });
            }
            Effect::Take { key } => {
                let carryover = self.carryover.clone();
                tokio::spawn(async move {
                    let result = carryover.take(key).await.map_err(|e| e.to_string());
                    let _ = tx.send(Command::Input(Input::CarryoverTaken { key, result }));
                });
            }
            Effect::CancelTimeout { .. } | Effect::Present { .. } | Effect::Consume { .. } => {}
        }
    }

    fn navigate(&self, cycle: u64, route: Route, tx: mpsc::UnboundedSender<Command>) {
        let navigator = self.context.navigator.clone();
        let path = route.path(&self.config.routes).to_string();
        tokio::spawn(async move {
            let result = navigator
                .replace(&path)
                .await
                .map_err(|source| NavigationError::Replace {
                    route: path.clone(),
                    source,
                })
                .map_err(|e| e.to_string());
            let _ = tx.send(Command::Input(Input::NavigationFinished {
                cycle,
                route,
                result,
            }));
        });
    }

    fn snapshot(&self) -> StatusSnapshot {
        let (phase, in_flight) = match &self.state.phase {
            Phase::Idle => (PhaseKind::Idle, None),
            Phase::Gating { .. } => (PhaseKind::Gating, None),
            Phase::InFlight { event, .. } => (PhaseKind::InFlight, Some(event.payload.clone())),
        };
        StatusSnapshot {
            phase,
            readiness: self.state.readiness_state(),
            auth: self.state.auth,
            queued: self.state.queue.peek().map(|e| e.payload.clone()),
            in_flight,
            last_outcome: self.state.last_outcome.clone(),
            timeout_armed: self.guard.armed_cycle().is_some(),
        }
    }
}
