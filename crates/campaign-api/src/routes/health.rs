//! Liveness endpoint.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving requests.
    pub status: &'static str,
    /// Crate version of the running binary.
    pub version: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Returns the router for the liveness endpoint.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
