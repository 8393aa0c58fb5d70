// ABOUTME: Coordinator configuration - timeout bound, settle delay, and route table.
// ABOUTME: Built with a fluent builder or loaded from JSON with per-field defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bound on how long an event may wait for readiness.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between navigating to the main view and surfacing the payload.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Navigation destinations used by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    /// Main/dashboard view where delivered links are shown.
    pub main: String,
    /// Entry view of the sign-in/sign-up flow.
    pub auth_entry: String,
    /// Application root, used as the fallback after a failed navigation.
    pub root: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            main: "/(tabs)/dashboard".to_string(),
            auth_entry: "/(auth)/sign-in".to_string(),
            root: "/".to_string(),
        }
    }
}

/// Configuration for a share coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub timeout: Duration,
    pub settle_delay: Duration,
    pub routes: RouteTable,
    /// Credential store key whose presence means "authenticated".
    pub credential_key: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            routes: RouteTable::default(),
            credential_key: "token".to_string(),
        }
    }
}

/// On-disk shape of the config. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    timeout_ms: Option<u64>,
    settle_delay_ms: Option<u64>,
    routes: Option<RouteTable>,
    credential_key: Option<String>,
}

impl RelayConfig {
    /// Create a new config builder.
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::new()
    }

    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        let mut builder = Self::builder();
        if let Some(ms) = raw.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = raw.settle_delay_ms {
            builder = builder.settle_delay(Duration::from_millis(ms));
        }
        if let Some(routes) = raw.routes {
            builder = builder.routes(routes);
        }
        if let Some(key) = raw.credential_key {
            builder = builder.credential_key(key);
        }
        builder.build()
    }
}

/// Builder for constructing coordinator configs.
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl Default for RelayConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayConfigBuilder {
    /// Create a new builder seeded with defaults.
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
        }
    }

    /// Set the readiness timeout bound.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the settle delay before the payload is surfaced.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    /// Replace the whole route table.
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.config.routes = routes;
        self
    }

    /// Set the credential key consulted by the auth resolver.
    pub fn credential_key(mut self, key: impl Into<String>) -> Self {
        self.config.credential_key = key.into();
        self
    }

    /// Validate and build the config.
    pub fn build(self) -> Result<RelayConfig, ConfigError> {
        if self.config.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be positive".into()));
        }
        if self.config.credential_key.trim().is_empty() {
            return Err(ConfigError::Invalid("credential_key must not be empty".into()));
        }
        Ok(self.config)
    }
}
