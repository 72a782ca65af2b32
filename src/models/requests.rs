//! Request DTOs for the cache server API
//!
//! Defines the query parameters accepted alongside raw tile bodies.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::distributed::EntryOptions;

/// Query parameters for storing a tile (PUT /tiles/*key)
///
/// At most one expiration setting may be given; with none, the entry lives
/// for one day.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetQuery {
    /// Absolute expiration as RFC 3339
    #[serde(default)]
    pub absolute_expiration: Option<DateTime<Utc>>,
    /// Lifetime in seconds from now
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Sliding lifetime in seconds; applied once, not renewed on read
    #[serde(default)]
    pub sliding_expiration: Option<u64>,
}

impl SetQuery {
    /// Validates the query
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        let given = [
            self.absolute_expiration.is_some(),
            self.expires_in.is_some(),
            self.sliding_expiration.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        if given > 1 {
            return Some("Only one expiration setting may be given".to_string());
        }
        if self.expires_in == Some(0) || self.sliding_expiration == Some(0) {
            return Some("Lifetime must be at least one second".to_string());
        }
        None
    }

    pub fn into_options(self) -> EntryOptions {
        EntryOptions {
            absolute_expiration: self.absolute_expiration,
            absolute_expiration_relative_to_now: self.expires_in.map(Duration::from_secs),
            sliding_expiration: self.sliding_expiration.map(Duration::from_secs),
        }
    }
}

/// Validates a tile key taken from the request path
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > 1024 {
        return Some("Key exceeds maximum length of 1024 characters".to_string());
    }
    None
}
