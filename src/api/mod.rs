//! API Module
//!
//! HTTP handlers and routing for the tile cache service.
//!
//! # Endpoints
//! - `GET|PUT|DELETE /tiles/*key` - Tile access
//! - `POST /sweep` - Manual expiration sweep
//! - `POST /lifecycle/{suspend,resume}` - Host lifecycle events
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
