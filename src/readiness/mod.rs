// ABOUTME: Readiness module - monotonic start-up signals gating event delivery.
// ABOUTME: Exposes the tracker plus the flag and partial-update types.

mod tracker;

pub use tracker::{ReadinessFlag, ReadinessState, ReadinessTracker, ReadinessUpdate};
