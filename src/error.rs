// ABOUTME: Defines all error types for share-relay using thiserror.
// ABOUTME: Collaborator failures get their own enums; RelayError covers the handle API.

/// Top-level error type returned by the coordinator handle.
///
/// Navigation and credential failures are absorbed inside the coordinator
/// and only surface in logs and outcomes, so they have no variant here.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Coordinator is not running")]
    Closed,
}

/// Errors from the durable key/value store backing carryover entries.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("read of '{key}' failed: {source}")]
    Read {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("write of '{key}' failed: {source}")]
    Write {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("remove of '{key}' failed: {source}")]
    Remove {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors from the host navigator.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("replace to '{route}' failed: {source}")]
    Replace {
        route: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors from the credential store.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("read of credential '{key}' failed: {source}")]
    Read {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
