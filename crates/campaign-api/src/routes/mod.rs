//! Route modules organized by bounded context.

pub mod campaigns;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Builds the full application router without middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/campaigns", campaigns::router())
        .with_state(state)
}
