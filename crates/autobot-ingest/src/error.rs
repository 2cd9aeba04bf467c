//! Error types for feed ingestion

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// An excerpt could not be decoded. Fatal for the whole run.
    #[error("Malformed excerpt #{index}: {message}")]
    MalformedExcerpt { index: u64, message: String },

    #[error("Failed to read source stream: {0}")]
    Read(#[from] std::io::Error),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Source file not found: {0}")]
    NotFound(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Pipeline task failed: {0}")]
    Task(String),

    #[error("Ingestion cancelled before completion")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IngestError {
    pub fn malformed(index: u64, message: impl Into<String>) -> Self {
        Self::MalformedExcerpt {
            index,
            message: message.into(),
        }
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }
}
