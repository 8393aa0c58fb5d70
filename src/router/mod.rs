// ABOUTME: Delivery router module - state machine, timeout guard, and coordinator actor.
// ABOUTME: Decides whether a shared link is delivered now or detoured through sign-in.

mod coordinator;
mod guard;
mod state;

pub use coordinator::{CoordinatorHandle, PhaseKind, RelayContext, ShareCoordinator, StatusSnapshot};
pub use guard::TimeoutGuard;
pub use state::{transition, Effect, Input, Outcome, Phase, RouterState, Step};

#[cfg(test)]
mod state_test;
