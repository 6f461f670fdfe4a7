//! Campaign platform API server entry point.

use std::sync::Arc;

use campaign_api::config::ServerConfig;
use campaign_api::error::AppError;
use campaign_api::routes;
use campaign_api::state::AppState;
use campaign_core::clock::{Clock, SystemClock};
use campaign_core::store::EventStore;
use campaign_event_store::in_memory_event_store::InMemoryEventStore;
use campaign_event_store::pg_event_store::PgEventStore;
use campaign_management::persistence::repository::EventSourcedCampaignRepository;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

async fn event_store(config: &ServerConfig) -> Result<Arc<dyn EventStore>, AppError> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; events are kept in memory and lost on restart");
        return Ok(Arc::new(InMemoryEventStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    let store = PgEventStore::new(pool);
    store.ensure_schema().await?;
    tracing::info!("Using PostgreSQL event store");
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting campaign API server");

    let config = ServerConfig::from_env()?;
    let addr = config.socket_addr()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = event_store(&config).await?;
    let repository = EventSourcedCampaignRepository::new(store, Arc::clone(&clock))
        .with_snapshot_interval(config.snapshot_interval);
    let app_state = AppState::new(clock, Arc::new(repository));

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!(
        snapshot_interval = config.snapshot_interval.get(),
        "Listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
