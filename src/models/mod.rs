//! Request and Response models for the cache server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP query strings and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{validate_key, SetQuery};
pub use responses::{
    format_time, DeleteResponse, ErrorResponse, HealthResponse, LifecycleResponse, SetResponse,
    StatsResponse, SweepResponse,
};
