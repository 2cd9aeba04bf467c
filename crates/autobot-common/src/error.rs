//! Error types for Autobot

use thiserror::Error;

/// Result type alias for Autobot operations
pub type Result<T> = std::result::Result<T, AutobotError>;

/// Main error type for Autobot
#[derive(Error, Debug)]
pub enum AutobotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown country of registration: {0}")]
    UnknownCountry(String),

    #[error("Invalid hash key: {0}")]
    InvalidHash(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
