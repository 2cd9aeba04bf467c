//! Server-specific error types

use crate::store::SyncOpId;
use autobot_common::AutobotError;
use autobot_ingest::IngestError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for HTTP handlers
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Vehicle store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Record(#[from] AutobotError),

    #[error("No such vehicle: {0}")]
    NoSuchVehicle(String),

    #[error("No sync operation with id {0}")]
    UnknownOperation(SyncOpId),

    #[error("History log entry has an unrecognised format: {0}")]
    MalformedLogEntry(String),

    #[error("Ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote lookup errors
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Lookup service responded with status code {0}")]
    Status(u16),

    #[error("Unable to decode lookup response: {0}")]
    Decode(String),
}

/// Errors surfaced by the HTTP API
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServerError::NotFound(ref message) => (StatusCode::NOT_FOUND, message.clone()),
            ServerError::BadRequest(ref message) => (StatusCode::BAD_REQUEST, message.clone()),
            ServerError::Store(StoreError::NoSuchVehicle(ref hash)) => {
                (StatusCode::NOT_FOUND, format!("No such vehicle: {}", hash))
            },
            ServerError::Store(ref e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            },
            ServerError::Lookup(ref e) => {
                tracing::error!("Lookup error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            },
            ServerError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
            },
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}
