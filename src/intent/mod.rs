// ABOUTME: Intent module - share-sheet events, the listener adapter, and the event queue.
// ABOUTME: Turns raw OS share intents into identified ExternalEvents.

mod event;
mod link;
mod listener;
mod queue;

pub use event::{EventOrigin, ExternalEvent};
pub use link::extract_link;
pub use listener::{IntentListener, IntentSource, MemoryIntentSource};
pub use queue::EventQueue;
