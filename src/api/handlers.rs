//! API Handlers
//!
//! HTTP request handlers for each tile cache endpoint.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::CacheStore;
use crate::distributed::DistributedCache;
use crate::error::{CacheError, Result};
use crate::lifecycle::LifecycleController;
use crate::models::{
    format_time, validate_key, DeleteResponse, HealthResponse, LifecycleResponse, SetQuery,
    SetResponse, StatsResponse, SweepResponse,
};
use crate::tasks::sweep_once;

/// Header carrying a tile's expiration on GET responses.
pub const EXPIRES_HEADER: &str = "x-cache-expires";

/// Application state shared across all handlers.
///
/// Every field shares the same underlying store.
#[derive(Clone)]
pub struct AppState {
    pub store: CacheStore,
    pub distributed: DistributedCache,
    pub lifecycle: LifecycleController,
}

impl AppState {
    /// Creates a new AppState around an opened store.
    pub fn new(store: CacheStore) -> Self {
        Self {
            distributed: DistributedCache::new(store.clone()),
            lifecycle: LifecycleController::new(store.clone()),
            store,
        }
    }

    /// Opens the store described by the configuration.
    pub async fn from_config(config: &crate::config::Config) -> Result<Self> {
        let store = CacheStore::from_config(config).await?;
        Ok(Self::new(store))
    }
}

/// Handler for GET /tiles/*key
///
/// Returns the raw tile bytes, with the expiration in `x-cache-expires`.
pub async fn get_tile_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    let entry = state
        .store
        .get(&key)
        .await
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    let expires = HeaderValue::from_str(&format_time(entry.expiration))
        .map_err(|e| CacheError::Internal(e.to_string()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::HeaderName::from_static(EXPIRES_HEADER), expires),
        ],
        entry.value,
    )
        .into_response())
}

/// Handler for PUT /tiles/*key
///
/// Stores the raw request body under `key`.
pub async fn put_tile_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SetQuery>,
    body: Bytes,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = validate_key(&key).or_else(|| query.validate()) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let size = body.len();
    let options = query.into_options();
    let expires = state
        .distributed
        .try_set(&key, body.to_vec(), &options)
        .await?;

    Ok(Json(SetResponse::new(key, size, expires)))
}

/// Handler for DELETE /tiles/*key
///
/// Removing a missing tile still succeeds.
pub async fn delete_tile_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.distributed.remove(&key).await;
    Json(DeleteResponse::new(key))
}

/// Handler for POST /sweep
pub async fn sweep_handler(State(state): State<AppState>) -> Json<SweepResponse> {
    let removed = sweep_once(&state.store).await;
    Json(SweepResponse { removed })
}

/// Handler for POST /lifecycle/suspend
pub async fn suspend_handler(State(state): State<AppState>) -> Json<LifecycleResponse> {
    state.lifecycle.suspend().await;
    Json(LifecycleResponse { open: false })
}

/// Handler for POST /lifecycle/resume
///
/// Reports 503 if the store could not be reopened.
pub async fn resume_handler(State(state): State<AppState>) -> Result<Json<LifecycleResponse>> {
    if state.lifecycle.resume().await {
        Ok(Json(LifecycleResponse { open: true }))
    } else {
        Err(CacheError::OpenFailure(
            state.store.location().display().to_string(),
        ))
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let store = &state.store;
    let counters = store.stats().await;

    Json(StatsResponse {
        backend: store.kind(),
        location: store.location().display().to_string(),
        open: store.is_open().await,
        entries: store.len().await,
        hit_rate: counters.hit_rate(),
        counters,
    })
}

/// Handler for GET /health
///
/// Always 200; a closed store reports "degraded".
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::for_store(state.store.is_open().await))
}
