//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use ridequeue_api::build_router;
use ridequeue_api::state::AppState;
use ridequeue_core::clock::SharedClock;
use ridequeue_test_support::{FixedClock, fixed_now, test_cache};
use sqlx::PgPool;
use tower::ServiceExt;

fn fixed_clock() -> SharedClock {
    Arc::new(FixedClock(fixed_now()))
}

/// Build the full app router over the in-memory backends with a fixed clock.
/// Uses the same route structure as `main.rs`.
pub fn build_test_app() -> Router {
    let clock = fixed_clock();
    let cache = Arc::new(test_cache(clock.clone()));
    build_router(AppState::in_memory(clock, cache))
}

/// Build the full app router over PostgreSQL with a fixed clock.
pub fn build_pg_test_app(pool: PgPool) -> Router {
    let clock = fixed_clock();
    let cache = Arc::new(test_cache(clock.clone()));
    build_router(AppState::postgres(pool, clock, cache))
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

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Create a ride and return its id.
pub async fn create_ride(app: Router, capacity: u32, cycle_duration_secs: i64) -> String {
    let (status, json) = post_json(
        app,
        "/api/v1/rides",
        &serde_json::json!({
            "name": "Coaster",
            "description": "integration test ride",
            "capacity": capacity,
            "cycle_duration_secs": cycle_duration_secs,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_owned()
}

/// Enter a customer and return their id.
pub async fn enter_customer(app: Router) -> String {
    let (status, json) = post_empty(app, "/api/v1/customers/enter").await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_owned()
}
