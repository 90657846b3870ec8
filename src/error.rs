//! Error types for Tensorify
//!
//! Provides standardized error handling across the engine and its services.

use thiserror::Error;

/// Errors that can occur in the search and plugin services
#[derive(Debug, Error)]
pub enum TensorifyError {
    /// Transport-level HTTP failures (connection refused, DNS, TLS)
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Plugin registry answered with a non-success status
    #[error("Registry error ({status}): {message}")]
    Registry { status: u16, message: String },

    /// Workflow backend answered with a non-success status
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Request exceeded its deadline
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Request was superseded by a newer one
    #[error("Request aborted")]
    Aborted,

    /// An install or update for this plugin is already running
    #[error("Plugin '{0}' already has a pending operation")]
    AlreadyInFlight(String),

    /// Malformed plugin slug
    #[error("Invalid plugin slug: {0}")]
    InvalidSlug(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for Tensorify operations
pub type TensorifyResult<T> = Result<T, TensorifyError>;
