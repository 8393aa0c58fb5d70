// ABOUTME: The ExternalEvent carried through the coordinator.
// ABOUTME: Each event has an id, a link payload, an arrival time, and an origin.

use tokio::time::Instant;
use uuid::Uuid;

use crate::carryover::CarryoverKey;

/// Where an event entered the coordinator from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    /// Fresh OS share intent; must be consumed at the source when it leaves the queue.
    Intent,
    /// Recovered from a carryover entry; there is no OS event to consume.
    Carryover(CarryoverKey),
}

/// A shared link awaiting delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEvent {
    pub id: Uuid,
    pub payload: String,
    pub arrived_at: Instant,
    pub origin: EventOrigin,
}

impl ExternalEvent {
    /// Create an event with a fresh id, stamped now.
    pub fn new(payload: impl Into<String>, origin: EventOrigin) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload: payload.into(),
            arrived_at: Instant::now(),
            origin,
        }
    }

    /// Create an event originating from an OS share intent.
    pub fn from_intent(payload: impl Into<String>) -> Self {
        Self::new(payload, EventOrigin::Intent)
    }

    /// True if leaving the queue must be reported to the OS source.
    pub fn needs_consume(&self) -> bool {
        self.origin == EventOrigin::Intent
    }
}
