// ABOUTME: The KeyValueStore seam, an in-memory store, and the typed CarryoverStore.
// ABOUTME: Takes are read-then-clear; the value is removed before it is acted upon.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;

/// Well-known carryover slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarryoverKey {
    /// Payload parked while the user goes through sign-in/sign-up.
    PendingSharedLink,
    /// Payload handed back by the auth flow within the same session.
    ImmediateShareLink,
}

impl CarryoverKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarryoverKey::PendingSharedLink => "pendingSharedLink",
            CarryoverKey::ImmediateShareLink => "immediateShareLink",
        }
    }
}

impl std::fmt::Display for CarryoverKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for a durable string key/value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;

    async fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error>;

    async fn remove(&self, key: &str) -> Result<(), anyhow::Error>;

    /// Read a value and clear it.
    ///
    /// The default issues `get` then `remove`. A crash between the two leaves
    /// the value in place, so it may be taken again on the next launch.
    /// Stores that can do better should override this with a single write.
    async fn take(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self.get(key).await.map_err(|source| StorageError::Read {
            key: key.to_string(),
            source,
        })?;
        if value.is_some() {
            self.remove(key).await.map_err(|source| StorageError::Remove {
                key: key.to_string(),
                source,
            })?;
        }
        Ok(value)
    }
}

/// Typed access to the carryover slots.
#[derive(Clone)]
pub struct CarryoverStore {
    store: Arc<dyn KeyValueStore>,
}

impl CarryoverStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Park a payload in a slot, replacing any previous value.
    pub async fn put(&self, key: CarryoverKey, payload: &str) -> Result<(), StorageError> {
        self.store
            .set(key.as_str(), payload)
            .await
            .map_err(|source| StorageError::Write {
                key: key.to_string(),
                source,
            })
    }

    /// Take a payload out of a slot. The slot is empty afterwards.
    pub async fn take(&self, key: CarryoverKey) -> Result<Option<String>, StorageError> {
        self.store.take(key.as_str()).await
    }

    /// Hand a payload back from the auth flow for same-session pickup.
    pub async fn stash_immediate(&self, payload: &str) -> Result<(), StorageError> {
        self.put(CarryoverKey::ImmediateShareLink, payload).await
    }
}

/// Operation recorded by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get(String),
    Set(String, String),
    Remove(String),
}

/// In-memory store for tests and simulation, with an operation log and
/// switchable failures.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    ops: Mutex<Vec<StoreOp>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_removes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    /// Every operation issued so far, in order.
    pub async fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().await.clone()
    }

    /// Current value without logging an operation.
    pub async fn value(&self, key: &str) -> Option<String> {
        self.values.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        self.ops.lock().await.push(StoreOp::Get(key.to_string()));
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("read failed"));
        }
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        self.ops
            .lock()
            .await
            .push(StoreOp::Set(key.to_string(), value.to_string()));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("write failed"));
        }
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), anyhow::Error> {
        self.ops.lock().await.push(StoreOp::Remove(key.to_string()));
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("remove failed"));
        }
        self.values.lock().await.remove(key);
        Ok(())
    }
}
