//! Ridequeue HTTP API.
//!
//! Thin axum layer over the queueing orchestrator and the reference data
//! catalogs. Route handlers translate requests into commands and map
//! `DomainError` to HTTP status codes; no queue logic lives here.

use axum::Router;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

/// Builds the full route table over `state`.
pub fn build_router(state: state::AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/rides", routes::rides::router())
        .nest("/api/v1/customers", routes::customers::router())
        .with_state(state)
}
