//! Gridwalk API server entry point.

use std::sync::Arc;

use gridwalk_api::config::ServerConfig;
use gridwalk_api::error::AppError;
use gridwalk_api::routes;
use gridwalk_api::state::AppState;
use gridwalk_core::clock::SystemClock;
use gridwalk_event_store::in_memory_event_repository::InMemoryEventRepository;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting gridwalk API server");

    let config = ServerConfig::from_env()?;
    let addr = config.socket_addr()?;

    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(InMemoryEventRepository::new()),
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
