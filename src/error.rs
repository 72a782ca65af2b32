//! Error types for the tile cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the tile cache.
///
/// The `OpenFailure`, `QueryFailure`, `WriteFailure` and `RepairFailure`
/// variants describe what the store was doing when an engine error occurred;
/// the engine variants carry the underlying error from each backend.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache (or expired)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key cannot be stored by this backend
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Store could neither be opened nor created
    #[error("Failed to open store: {0}")]
    OpenFailure(String),

    /// Lookup failed inside the engine
    #[error("Query failed: {0}")]
    QueryFailure(String),

    /// Write was dropped after the repair ladder ran
    #[error("Write failed: {0}")]
    WriteFailure(String),

    /// Neither reindex nor recreation made the store usable
    #[error("Repair failed: {0}")]
    RepairFailure(String),

    /// Embedded record store (redb) error
    #[error("Embedded store error: {0}")]
    Embedded(#[from] redb::Error),

    /// Relational store (SQLite) error
    #[error("Relational store error: {0}")]
    Relational(#[from] rusqlite::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidKey(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::OpenFailure(_) | CacheError::RepairFailure(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the tile cache.
pub type Result<T> = std::result::Result<T, CacheError>;
