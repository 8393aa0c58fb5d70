// ABOUTME: Authentication module - tri-state auth resolution from a credential store.
// ABOUTME: Contains the CredentialStore seam and the run-once AuthResolver.

mod resolver;

pub use resolver::{AuthResolver, AuthState, CredentialStore, MemoryCredentials};
