//! Error types for sitehost
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for sitehost
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input (empty domain, unknown region, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// DNS provider-related errors
    #[error("DNS provider error: {0}")]
    Dns(String),

    /// Storage provider-related errors
    #[error("Storage provider error: {0}")]
    Storage(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// A listing was larger than the single page the workflow scans
    #[error("Scale limit exceeded: {0}")]
    ScaleLimit(String),

    /// Both buckets already serve content and strict exclusivity is on
    #[error("Both {apex} and {www} are configured as websites")]
    AmbiguousWebsites {
        /// Apex bucket name
        apex: String,
        /// www bucket name
        www: String,
    },
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a DNS provider error
    pub fn dns(msg: impl Into<String>) -> Self {
        Self::Dns(msg.into())
    }

    /// Create a storage provider error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a scale limit error
    pub fn scale_limit(msg: impl Into<String>) -> Self {
        Self::ScaleLimit(msg.into())
    }

    /// Whether this error was raised before any provider call
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::Config(_))
    }
}
