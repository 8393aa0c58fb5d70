// ABOUTME: Prelude module - convenient imports for wiring a coordinator into a host.
// ABOUTME: Use `use share_relay::prelude::*;` to get started quickly.

pub use crate::auth::{AuthState, CredentialStore, MemoryCredentials};
pub use crate::carryover::{
    CarryoverKey, CarryoverStore, JsonFileStore, KeyValueStore, MemoryStore, StoreOp,
};
pub use crate::config::{RelayConfig, RelayConfigBuilder, RouteTable};
pub use crate::error::{ConfigError, CredentialError, NavigationError, RelayError, StorageError};
pub use crate::intent::{IntentSource, MemoryIntentSource};
pub use crate::navigation::{Navigator, RecordingNavigator, Route};
pub use crate::presentation::SharePresentation;
pub use crate::readiness::{ReadinessFlag, ReadinessState, ReadinessUpdate};
pub use crate::router::{
    CoordinatorHandle, Outcome, PhaseKind, RelayContext, ShareCoordinator, StatusSnapshot,
};
