//! Error types for the registry service
//!
//! Provides unified error handling using thiserror. Only `ServiceError`
//! reaches callers; cache and notification failures are logged and dropped.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Store Error ==
/// Failure of the authoritative record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend rejected or failed the call
    #[error("store backend error: {0}")]
    Backend(String),

    /// The database driver reported a failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The call did not complete within the deadline
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

// == Cache Error ==
/// Failure of the cache layer. Never surfaced to callers.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty or exceeds the maximum length
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// Value exceeds the maximum size
    #[error("cache value too large: {0} bytes")]
    ValueTooLarge(usize),

    /// Cached bytes could not be encoded or decoded
    #[error("cache codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The backend rejected or failed the call
    #[error("cache backend error: {0}")]
    Backend(String),

    /// The call did not complete within the deadline
    #[error("cache call timed out after {0:?}")]
    Timeout(Duration),
}

// == Notification Error ==
/// Failure to hand a notification to the channel. Never surfaced to callers.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// The dispatch queue has no free slot
    #[error("notification queue is full")]
    QueueFull,

    /// The dispatcher has shut down
    #[error("notification queue is closed")]
    QueueClosed,

    /// The payload could not be serialized
    #[error("notification encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The channel refused the message
    #[error("publish failed: {0}")]
    Publish(String),
}

// == Service Error ==
/// Errors that abort a registry operation.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or empty required input
    #[error("{0}")]
    Validation(String),

    /// Referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Store failure while performing the named operation
    #[error("{action}: {source}")]
    Store {
        action: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ServiceError {
    /// Wraps a store failure with the caller-facing message for the operation.
    pub fn store(action: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| ServiceError::Store { action, source }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServiceError::Store { action, source } => {
                error!(error = %source, "{}", action);
                (StatusCode::INTERNAL_SERVER_ERROR, action.to_string())
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for registry operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
