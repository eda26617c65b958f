//! Error types.
//!
//! Two failure classes exist: configuration errors (bad bucket/sample
//! counts, empty inputs, unknown hash names, unreadable config) and domain
//! errors (Beta parameters or probabilities out of range). Neither is
//! retryable; every operation is a local computation.

use thiserror::Error;

/// Result type for hashdist operations.
pub type Result<T> = std::result::Result<T, HashDistError>;

/// Errors that can occur while simulating, testing or summarizing.
#[derive(Debug, Error)]
pub enum HashDistError {
    /// Invalid run configuration (counts, empty input, zero totals).
    #[error("configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A configuration names a hash function that is not registered.
    #[error("configuration error: unknown hash function `{name}`")]
    UnknownHash {
        /// Requested name
        name: String,
    },

    /// Distribution parameter or argument outside its domain.
    #[error("domain error: {message}")]
    Domain {
        /// Error message
        message: String,
    },

    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for [`crate::config::SimulationConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl HashDistError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    /// True for the configuration class (`Config`, `UnknownHash`, `Io`, `Parse`).
    pub fn is_config(&self) -> bool {
        !self.is_domain()
    }

    /// True for [`HashDistError::Domain`].
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain { .. })
    }
}
