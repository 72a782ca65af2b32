//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tile_cache::{api::create_router, cache::CacheStore, AppState, BackendKind};
use tower::ServiceExt;

// == Helper Functions ==

async fn create_test_app(kind: BackendKind) -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::open(kind.create(dir.path().join("cache")))
        .await
        .unwrap();
    (dir, create_router(AppState::new(store)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Vec<u8>) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_to_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// == Tile Endpoint Tests ==

#[tokio::test]
async fn test_put_then_get_returns_raw_bytes() {
    for kind in [
        BackendKind::Embedded,
        BackendKind::Relational,
        BackendKind::Filesystem,
    ] {
        let (_dir, app) = create_test_app(kind).await;
        let tile: Vec<u8> = (0..=255).collect();

        let response = send(&app, "PUT", "/tiles/osm/3/4/5", tile.clone()).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", kind);
        let json = body_to_json(response).await;
        assert_eq!(json["key"], "osm/3/4/5");
        assert_eq!(json["size"], 256);

        let response = send(&app, "GET", "/tiles/osm/3/4/5", Vec::new()).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", kind);
        assert_eq!(
            response.headers()["content-type"],
            "application/octet-stream"
        );
        let expires = response.headers()["x-cache-expires"].to_str().unwrap().to_string();
        assert_eq!(expires, json["expires"].as_str().unwrap());
        assert_eq!(body_bytes(response).await, tile, "{}", kind);
    }
}

#[tokio::test]
async fn test_put_with_absolute_expiration() {
    let (_dir, app) = create_test_app(BackendKind::Relational).await;

    let response = send(
        &app,
        "PUT",
        "/tiles/k?absolute_expiration=2099-01-01T00:00:00Z",
        b"v".to_vec(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["expires"], "2099-01-01T00:00:00Z");
}

#[tokio::test]
async fn test_put_with_past_expiration_is_a_miss() {
    let (_dir, app) = create_test_app(BackendKind::Embedded).await;

    let response = send(
        &app,
        "PUT",
        "/tiles/old?absolute_expiration=2000-01-01T00:00:00Z",
        b"v".to_vec(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/tiles/old", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "POST", "/sweep", Vec::new()).await;
    assert_eq!(body_to_json(response).await["removed"], 1);
}

#[tokio::test]
async fn test_put_conflicting_expirations_rejected() {
    let (_dir, app) = create_test_app(BackendKind::Embedded).await;

    let response = send(&app, "PUT", "/tiles/k?expires_in=5&sliding_expiration=5", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("expiration"));
}

#[tokio::test]
async fn test_put_malformed_timestamp_rejected() {
    let (_dir, app) = create_test_app(BackendKind::Embedded).await;

    let response = send(&app, "PUT", "/tiles/k?absolute_expiration=tomorrow", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_filesystem_rejects_escaping_key() {
    let (_dir, app) = create_test_app(BackendKind::Filesystem).await;

    let response = send(&app, "PUT", "/tiles/a/%2E%2E/b", b"v".to_vec()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_missing_tile() {
    let (_dir, app) = create_test_app(BackendKind::Embedded).await;

    let response = send(&app, "GET", "/tiles/nonexistent", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_to_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("nonexistent"));
}

#[tokio::test]
async fn test_delete_tile() {
    let (_dir, app) = create_test_app(BackendKind::Relational).await;

    send(&app, "PUT", "/tiles/to/delete", b"v".to_vec()).await;

    let response = send(&app, "DELETE", "/tiles/to/delete", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await["key"], "to/delete");

    let response = send(&app, "GET", "/tiles/to/delete", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Removing again is still fine
    let response = send(&app, "DELETE", "/tiles/to/delete", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// == Lifecycle Endpoint Tests ==

#[tokio::test]
async fn test_suspend_serves_misses_until_resume() {
    let (_dir, app) = create_test_app(BackendKind::Embedded).await;

    send(&app, "PUT", "/tiles/kept", b"v".to_vec()).await;

    let response = send(&app, "POST", "/lifecycle/suspend", Vec::new()).await;
    assert_eq!(body_to_json(response).await["open"], false);

    let response = send(&app, "GET", "/tiles/kept", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Writes while suspended are accepted and discarded
    let response = send(&app, "PUT", "/tiles/lost", b"v".to_vec()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/health", Vec::new()).await;
    assert_eq!(body_to_json(response).await["status"], "degraded");

    let response = send(&app, "POST", "/lifecycle/resume", Vec::new()).await;
    assert_eq!(body_to_json(response).await["open"], true);

    let response = send(&app, "GET", "/tiles/kept", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, "GET", "/tiles/lost", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Stats & Health Endpoint Tests ==

#[tokio::test]
async fn test_stats_track_requests() {
    let (_dir, app) = create_test_app(BackendKind::Filesystem).await;

    send(&app, "PUT", "/tiles/a/b/c", b"v".to_vec()).await;
    send(&app, "GET", "/tiles/a/b/c", Vec::new()).await;
    send(&app, "GET", "/tiles/a/b/missing", Vec::new()).await;

    let response = send(&app, "GET", "/stats", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["backend"], "filesystem");
    assert_eq!(json["open"], true);
    assert_eq!(json["entries"], 1);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["writes"], 1);
    assert_eq!(json["hit_rate"], 0.5);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, app) = create_test_app(BackendKind::Relational).await;

    let response = send(&app, "GET", "/health", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_unknown_route() {
    let (_dir, app) = create_test_app(BackendKind::Embedded).await;

    let response = send(&app, "GET", "/get/legacy", Vec::new()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
