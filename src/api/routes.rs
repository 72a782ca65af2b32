//! API Routes
//!
//! Configures the Axum router with all tile cache endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_tile_handler, get_tile_handler, health_handler, put_tile_handler, resume_handler,
    stats_handler, suspend_handler, sweep_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /tiles/*key` - Raw tile bytes
/// - `PUT /tiles/*key` - Store the request body as a tile
/// - `DELETE /tiles/*key` - Remove a tile
/// - `POST /sweep` - Delete expired tiles now
/// - `POST /lifecycle/suspend` - Close the store
/// - `POST /lifecycle/resume` - Reopen the store
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/tiles/*key",
            get(get_tile_handler)
                .put(put_tile_handler)
                .delete(delete_tile_handler),
        )
        .route("/sweep", post(sweep_handler))
        .route("/lifecycle/suspend", post(suspend_handler))
        .route("/lifecycle/resume", post(resume_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
