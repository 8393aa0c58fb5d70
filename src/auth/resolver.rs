// ABOUTME: Resolves the session's authentication state from a credential store.
// ABOUTME: Fails closed to Unauthenticated and caches the answer for the coordinator lifetime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::error::CredentialError;

/// Authentication status as known to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Not yet resolved.
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    /// Collapse `Unknown` to `Unauthenticated` for forced routing decisions.
    pub fn or_unauthenticated(self) -> AuthState {
        match self {
            AuthState::Unknown => AuthState::Unauthenticated,
            other => other,
        }
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthState::Unknown => write!(f, "unknown"),
            AuthState::Authenticated => write!(f, "authenticated"),
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

/// Trait for reading stored credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a credential by key. `Ok(None)` means no credential is stored.
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
}

/// Resolves authentication exactly once per coordinator lifetime.
pub struct AuthResolver {
    store: Arc<dyn CredentialStore>,
    key: String,
    resolved: OnceCell<AuthState>,
}

impl AuthResolver {
    /// Create a resolver reading `key` from `store`.
    pub fn new(store: Arc<dyn CredentialStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            resolved: OnceCell::new(),
        }
    }

    /// Resolve the authentication state.
    ///
    /// The credential store is read on the first call only; concurrent and
    /// later callers await the same cached result. A read failure yields
    /// `Unauthenticated` rather than an error so that readiness is never
    /// blocked on the credential store.
    pub async fn resolve(&self) -> AuthState {
        *self
            .resolved
            .get_or_init(|| async {
                match self.read().await {
                    Ok(Some(token)) if !token.trim().is_empty() => AuthState::Authenticated,
                    Ok(_) => AuthState::Unauthenticated,
                    Err(e) => {
                        tracing::warn!(error = %e, "Credential read failed, treating as signed out");
                        AuthState::Unauthenticated
                    }
                }
            })
            .await
    }

    /// The cached result, if resolution has completed.
    pub fn cached(&self) -> Option<AuthState> {
        self.resolved.get().copied()
    }

    async fn read(&self) -> Result<Option<String>, CredentialError> {
        self.store
            .get(&self.key)
            .await
            .map_err(|source| CredentialError::Read {
                key: self.key.clone(),
                source,
            })
    }
}

/// In-memory credential store for tests and simulation.
#[derive(Default)]
pub struct MemoryCredentials {
    values: Mutex<HashMap<String, String>>,
    fail: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryCredentials {
    /// Create an empty store (signed out).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a token under `"token"`.
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set("token", token);
        store
    }

    /// Store a credential.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.into(), value.into());
    }

    /// Make every subsequent read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of reads performed so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentials {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("credential store unavailable"));
        }
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }
}
