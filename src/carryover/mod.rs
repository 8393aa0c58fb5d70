// ABOUTME: Carryover module - durable single-slot mailboxes for shared links.
// ABOUTME: Ferries a payload across the auth detour and back, with take-and-clear reads.

mod file_store;
mod store;

pub use file_store::JsonFileStore;
pub use store::{CarryoverKey, CarryoverStore, KeyValueStore, MemoryStore, StoreOp};
