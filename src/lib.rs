// ABOUTME: Root module for share-relay - deferred delivery of OS share intents.
// ABOUTME: Re-exports the coordinator and the collaborator traits a host app implements.

pub mod auth;
pub mod carryover;
pub mod config;
pub mod error;
pub mod intent;
pub mod navigation;
pub mod prelude;
pub mod presentation;
pub mod readiness;
pub mod router;

pub use error::RelayError;
pub use router::{CoordinatorHandle, RelayContext, ShareCoordinator};
