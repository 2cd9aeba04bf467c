//! Error types for the Autobot CLI
//!
//! Messages are user-facing and suggest how to fix the problem.

use autobot_server::StoreError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file is missing
    #[error("Configuration file not found: '{0}'. Run 'autobot init' to create one.")]
    ConfigNotFound(String),

    /// Configuration file exists but is invalid
    #[error("Configuration error: {0}. Check the configuration file and AUTOBOT__* environment variables.")]
    Config(String),

    /// `init` would overwrite an existing file
    #[error("Configuration file already exists: '{0}'. Remove it first to write a fresh template.")]
    AlreadyInitialized(String),

    /// Named provider has no configuration section
    #[error("Unknown provider '{0}'. Add a [providers.{0}] section to the configuration.")]
    UnknownProvider(String),

    /// No matching record
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    /// Vehicle store failure
    #[error("Store error: {0}. Check that the store is reachable with the configured [store] settings.")]
    Store(#[from] StoreError),

    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
