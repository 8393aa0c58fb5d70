// ABOUTME: Single-slot event queue with last-write-wins overwrite.
// ABOUTME: Holds at most one ExternalEvent awaiting routing.

use super::ExternalEvent;

/// Holds zero or one pending event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQueue {
    slot: Option<ExternalEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an event, returning the one it superseded (if any).
    pub fn put(&mut self, event: ExternalEvent) -> Option<ExternalEvent> {
        self.slot.replace(event)
    }

    /// Remove and return the queued event.
    pub fn take(&mut self) -> Option<ExternalEvent> {
        self.slot.take()
    }

    pub fn peek(&self) -> Option<&ExternalEvent> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
