//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use gridwalk_core::clock::Clock;
use gridwalk_core::repository::EventRepository;
use gridwalk_event_store::in_memory_event_repository::InMemoryEventRepository;
use gridwalk_test_support::FixedClock;
use http_body_util::BodyExt;
use tower::ServiceExt;

use gridwalk_api::routes;
use gridwalk_api::state::AppState;

/// A fresh store, shared by every app built from it.
pub fn new_store() -> Arc<dyn EventRepository> {
    Arc::new(InMemoryEventRepository::new())
}

/// Build the full app router over `store` with a fixed clock. Uses the same
/// route structure as `main.rs`.
pub fn build_test_app(store: &Arc<dyn EventRepository>) -> Router {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::default());
    routes::router().with_state(AppState::new(clock, Arc::clone(store)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a bodyless request and return the response.
pub async fn request(app: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    request(app, "GET", uri).await
}

/// Start a session on the `start`/`left`/`right` cross and return its id.
pub async fn start_cross_session(store: &Arc<dyn EventRepository>) -> String {
    let (status, json) = post_json(
        build_test_app(store),
        "/api/v1/navigation",
        &serde_json::json!({
            "initial_track_id": "start",
            "base_tracks": {
                "start": { "position": { "x": 0, "y": 0 }, "payload": "S" },
                "left": { "position": { "x": -1, "y": 0 }, "payload": "L" },
                "right": { "position": { "x": 1, "y": 0 }, "payload": "R" }
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["session_id"].as_str().unwrap().to_owned()
}
