//! Typed errors for the monitoring core.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors raised by state store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller passed data the store cannot persist (missing url, empty hash)
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded or decoded as JSON
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Relational backend failed
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Shorthand for an invalid-argument failure.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// Errors raised by the page source collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Fetch did not complete within the request timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Page no longer exists
    #[error("not found: {url}")]
    NotFound { url: String },
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment value could not be parsed
    #[error("invalid value for {key}: {value}")]
    Invalid { key: String, value: String },

    /// The store keeps a different number of versions than configured
    #[error("store retains {store} versions per URL but max_versions is {configured}")]
    RetentionMismatch { configured: usize, store: usize },
}

/// Errors that can occur while running a monitoring cycle.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Persisting or reading snapshots failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Fetching a page failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration error
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;
