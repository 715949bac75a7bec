//! Ridequeue API server entry point.

use std::sync::Arc;

use ridequeue_api::config::Config;
use ridequeue_api::error::AppError;
use ridequeue_api::state::AppState;
use ridequeue_core::cache::StateCache;
use ridequeue_core::clock::{SharedClock, SystemClock};
use ridequeue_event_store::schema::run_migrations;
use sqlx::postgres::PgPoolOptions;
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

    tracing::info!("Starting ridequeue API server");

    let config = Config::from_env()?;
    let clock: SharedClock = Arc::new(SystemClock);
    let cache = Arc::new(StateCache::new(config.state_cache_capacity, clock.clone()));

    let app_state = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            run_migrations(&pool).await?;
            tracing::info!("Connected to PostgreSQL and applied migrations");
            AppState::postgres(pool, clock, cache)
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set; using in-memory event log and catalog, state is lost on restart"
            );
            AppState::in_memory(clock, cache)
        }
    };

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = ridequeue_api::build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
