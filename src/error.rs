//! Error types for sqlhint
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors with clear error chains.
//!
//! Note that metadata fetch failures never escape the suggestion engine:
//! the metadata cache logs them and tags the affected key as failed.

/// Main error type for sqlhint
#[derive(Debug, thiserror::Error)]
pub enum SqlhintError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by a resource call to the metadata backend
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The backend does not serve this resource path
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// The backend answered with an error
    #[error("Backend error: {0}")]
    Backend(String),

    /// The request never reached the backend
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape
    #[error("Malformed response for '{resource}': {source}")]
    Malformed {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Home directory not found
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Config file not found or unreadable
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Specialized Result type for sqlhint operations
pub type Result<T> = std::result::Result<T, SqlhintError>;

/// Specialized Result type for resource calls
pub type ResourceResult<T> = std::result::Result<T, ResourceError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
