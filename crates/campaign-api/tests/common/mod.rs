//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use campaign_core::clock::Clock;
use campaign_core::store::EventStore;
use campaign_event_store::in_memory_event_store::InMemoryEventStore;
use campaign_management::persistence::repository::EventSourcedCampaignRepository;
use campaign_test_support::FixedClock;
use http_body_util::BodyExt;
use tower::ServiceExt;

use campaign_api::routes;
use campaign_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::reference())
}

/// Build the full app router over `event_store` with a deterministic clock.
/// Uses the same route structure as `main.rs`.
pub fn build_test_app_with(event_store: Arc<dyn EventStore>) -> Router {
    let clock = fixed_clock();
    let repository = EventSourcedCampaignRepository::new(event_store, Arc::clone(&clock));
    routes::app(AppState::new(clock, Arc::new(repository)))
}

/// Build the full app router over a fresh in-memory event store.
pub fn build_test_app() -> Router {
    build_test_app_with(Arc::new(InMemoryEventStore::new()))
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

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
