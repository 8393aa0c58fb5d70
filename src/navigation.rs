// ABOUTME: Navigation seam - the host router the coordinator drives.
// ABOUTME: Defines the Route destinations, the Navigator trait, and a recording navigator.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::RouteTable;

/// Destinations the coordinator navigates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Main/dashboard view that displays delivered links.
    Main,
    /// Entry of the sign-in/sign-up flow.
    AuthEntry,
    /// Application root, the fallback after a failed navigation.
    Root,
}

impl Route {
    /// Resolve to a concrete path.
    pub fn path<'a>(&self, routes: &'a RouteTable) -> &'a str {
        match self {
            Route::Main => &routes.main,
            Route::AuthEntry => &routes.auth_entry,
            Route::Root => &routes.root,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Main => write!(f, "main"),
            Route::AuthEntry => write!(f, "auth_entry"),
            Route::Root => write!(f, "root"),
        }
    }
}

/// Trait for the host application's router.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Replace the current screen with `path`.
    async fn replace(&self, path: &str) -> Result<(), anyhow::Error>;
}

/// Navigator that records every path and can be told to fail.
#[derive(Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<String>>,
    fail_paths: Mutex<Vec<String>>,
    fail_all: AtomicBool,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every navigation to `path`.
    pub async fn fail_on(&self, path: impl Into<String>) {
        self.fail_paths.lock().await.push(path.into());
    }

    /// Fail every navigation.
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Paths requested so far, including failed attempts.
    pub async fn history(&self) -> Vec<String> {
        self.history.lock().await.clone()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn replace(&self, path: &str) -> Result<(), anyhow::Error> {
        self.history.lock().await.push(path.to_string());
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("navigator not mounted"));
        }
        if self.fail_paths.lock().await.iter().any(|p| p == path) {
            return Err(anyhow::anyhow!("route '{}' rejected", path));
        }
        Ok(())
    }
}
