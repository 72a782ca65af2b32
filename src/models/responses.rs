//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies. Tile bodies
//! themselves are returned raw, not as JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::cache::{BackendKind, CacheStats};

/// Response body for storing a tile (PUT /tiles/*key)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// The key that was set
    pub key: String,
    /// Stored size in bytes
    pub size: usize,
    /// Resolved expiration in RFC 3339
    pub expires: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, size: usize, expires: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            size,
            expires: format_time(expires),
        }
    }
}

/// Response body for removing a tile (DELETE /tiles/*key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' removed", key),
            key,
        }
    }
}

/// Response body for a manual sweep (POST /sweep)
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    /// Expired entries deleted by this pass
    pub removed: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub backend: BackendKind,
    pub location: String,
    pub open: bool,
    /// Stored entries, including expired ones not yet swept
    pub entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    #[serde(flatten)]
    pub counters: CacheStats,
}

/// Response body for the lifecycle endpoints
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleResponse {
    pub open: bool,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" while the store is open, "degraded" while it serves misses
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn for_store(open: bool) -> Self {
        Self {
            status: if open { "healthy" } else { "degraded" }.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// RFC 3339 with as many fractional digits as needed.
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
