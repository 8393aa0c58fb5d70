// ABOUTME: Adapter over the OS share-intent mechanism.
// ABOUTME: Surfaces at most one pending event and forwards consume() exactly once per event.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::{extract_link, ExternalEvent};

/// Trait over the platform share-intent mechanism.
///
/// Implementations hold at most one pending intent. After `consume()` the
/// same intent must no longer be reported, even if the hosting view reloads.
pub trait IntentSource: Send + Sync {
    fn has_pending(&self) -> bool;

    /// Raw shared text of the pending intent.
    fn peek(&self) -> Option<String>;

    fn consume(&self);
}

/// Outstanding event handed to the coordinator but not yet consumed.
#[derive(Debug, Clone)]
struct Outstanding {
    id: Uuid,
    raw: String,
}

/// Turns raw intents into [`ExternalEvent`]s and guards `consume()`.
///
/// Polling the same still-pending intent twice yields one event. `consume()`
/// reaches the source only for the most recently surfaced event and only once.
pub struct IntentListener {
    source: Arc<dyn IntentSource>,
    outstanding: Option<Outstanding>,
    /// Raw text of the last consumed intent, until the source stops reporting it.
    consumed: Option<String>,
}

impl IntentListener {
    pub fn new(source: Arc<dyn IntentSource>) -> Self {
        Self {
            source,
            outstanding: None,
            consumed: None,
        }
    }

    /// True if the source holds an intent that has not been consumed here.
    pub fn has_pending(&mut self) -> bool {
        self.peek_raw().is_some()
    }

    /// Normalized payload of the pending intent, without surfacing it.
    pub fn peek(&mut self) -> Option<String> {
        self.peek_raw().and_then(|raw| extract_link(&raw))
    }

    /// Surface the pending intent as a new event.
    ///
    /// Returns `None` when nothing is pending, when the pending intent has
    /// already been surfaced, or when its text is blank (blank intents are
    /// consumed at the source and dropped).
    pub fn poll(&mut self) -> Option<ExternalEvent> {
        let raw = self.peek_raw()?;

        if let Some(outstanding) = &self.outstanding {
            if outstanding.raw == raw {
                return None;
            }
        }

        let Some(payload) = extract_link(&raw) else {
            tracing::debug!("Dropping blank share intent");
            self.source.consume();
            self.consumed = Some(raw);
            self.outstanding = None;
            return None;
        };

        let event = ExternalEvent::from_intent(payload);
        self.outstanding = Some(Outstanding { id: event.id, raw });
        Some(event)
    }

    /// Report that `event_id` left the queue.
    ///
    /// Returns true if the source was told to consume. Superseded or already
    /// consumed ids are ignored.
    pub fn consume(&mut self, event_id: Uuid) -> bool {
        match self.outstanding.take() {
            Some(outstanding) if outstanding.id == event_id => {
                self.source.consume();
                self.consumed = Some(outstanding.raw);
                true
            }
            other => {
                self.outstanding = other;
                false
            }
        }
    }

    fn peek_raw(&mut self) -> Option<String> {
        if !self.source.has_pending() {
            // The source has caught up; a later identical share is a new intent.
            self.consumed = None;
            return None;
        }
        let raw = self.source.peek()?;
        if self.consumed.as_deref() == Some(raw.as_str()) {
            return None;
        }
        Some(raw)
    }
}

/// In-memory intent source for tests and simulation.
#[derive(Default)]
pub struct MemoryIntentSource {
    pending: Mutex<Option<String>>,
    consumes: AtomicUsize,
    /// Keep reporting consumed intents, like a source that replays on reload.
    sticky: bool,
}

impl MemoryIntentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that keeps reporting an intent after `consume()`.
    pub fn sticky() -> Self {
        Self {
            sticky: true,
            ..Self::default()
        }
    }

    /// Simulate the OS handing over shared text.
    pub fn share(&self, text: impl Into<String>) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        *pending = Some(text.into());
    }

    /// Number of times `consume()` has been called.
    pub fn consumes(&self) -> usize {
        self.consumes.load(Ordering::SeqCst)
    }
}

impl IntentSource for MemoryIntentSource {
    fn has_pending(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.is_some()
    }

    fn peek(&self) -> Option<String> {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.clone()
    }

    fn consume(&self) {
        self.consumes.fetch_add(1, Ordering::SeqCst);
        if !self.sticky {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            *pending = None;
        }
    }
}
