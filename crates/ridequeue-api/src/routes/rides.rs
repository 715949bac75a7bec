//! Routes for rides and their queues.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use chrono::{DateTime, TimeDelta, Utc};
use ridequeue_core::catalog::Ride;
use ridequeue_core::clock::Clock;
use ridequeue_core::error::DomainError;
use ridequeue_queueing::application::query_handlers;
use ridequeue_rides::domain::aggregates::RideQueueState;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Riders served per cycle.
    pub capacity: u32,
    /// Cycle length in seconds.
    pub cycle_duration_secs: i64,
}

/// Queue state of one ride.
#[derive(Debug, Serialize)]
pub struct RideQueueResponse {
    /// The ride identifier.
    pub ride_id: Uuid,
    /// Customers currently waiting.
    pub queue_count: u32,
    /// When a customer joining now would be served.
    pub estimated_service_time: DateTime<Utc>,
    /// Seconds until `estimated_service_time`, never negative.
    pub wait_seconds: i64,
    /// When the state was derived.
    pub updated_at: DateTime<Utc>,
}

impl RideQueueResponse {
    /// Renders `state` as observed at `now`.
    #[must_use]
    pub fn from_state(state: &RideQueueState, now: DateTime<Utc>) -> Self {
        Self {
            ride_id: state.ride_id,
            queue_count: state.queue_count,
            estimated_service_time: state.estimated_service_time,
            wait_seconds: state.wait_time(now).num_seconds(),
            updated_at: state.updated_at,
        }
    }
}

/// A ride with its current queue.
#[derive(Debug, Serialize)]
pub struct RideResponse {
    /// Ride identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Riders served per cycle.
    pub capacity: u32,
    /// Cycle length in seconds.
    pub cycle_duration_secs: i64,
    /// Customers currently waiting.
    pub queue_count: u32,
    /// Seconds a customer joining now would wait.
    pub wait_seconds: i64,
}

impl RideResponse {
    fn new(ride: &Ride, state: &RideQueueState, now: DateTime<Utc>) -> Self {
        Self {
            id: ride.id,
            name: ride.name.clone(),
            description: ride.description.clone(),
            capacity: ride.capacity.get(),
            cycle_duration_secs: ride.cycle_duration.num_seconds(),
            queue_count: state.queue_count,
            wait_seconds: state.wait_time(now).num_seconds(),
        }
    }
}

/// GET /
#[instrument(skip(state))]
async fn list_rides(State(state): State<AppState>) -> Result<Json<Vec<RideResponse>>, ApiError> {
    let listing = query_handlers::list_ride_queues(
        state.clock.as_ref(),
        &*state.event_log,
        &state.cache,
        &*state.rides,
    )
    .await?;

    let now = state.clock.now();
    let rides = listing
        .iter()
        .map(|(ride, queue)| RideResponse::new(ride, queue, now))
        .collect();

    Ok(Json(rides))
}

/// POST /
#[instrument(skip(state, request), fields(name = %request.name))]
async fn create_ride(
    State(state): State<AppState>,
    Json(request): Json<CreateRideRequest>,
) -> Result<(StatusCode, Json<RideResponse>), ApiError> {
    let cycle_duration = TimeDelta::try_seconds(request.cycle_duration_secs).ok_or_else(|| {
        DomainError::Validation(format!(
            "cycle_duration_secs out of range: {}",
            request.cycle_duration_secs
        ))
    })?;
    let ride = Ride::new(
        request.name,
        request.description,
        request.capacity,
        cycle_duration,
    )?;
    state.rides.add_ride(&ride).await?;

    info!(ride_id = %ride.id, "ride added");

    let now = state.clock.now();
    let queue = query_handlers::get_ride_queue_state(
        ride.id,
        state.clock.as_ref(),
        &*state.event_log,
        &state.cache,
        &*state.rides,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(RideResponse::new(&ride, &queue, now))))
}

/// GET /{ride_id}/queue
#[instrument(skip(state))]
async fn get_ride_queue(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<RideQueueResponse>, ApiError> {
    let queue = query_handlers::get_ride_queue_state(
        ride_id,
        state.clock.as_ref(),
        &*state.event_log,
        &state.cache,
        &*state.rides,
    )
    .await?;

    Ok(Json(RideQueueResponse::from_state(&queue, state.clock.now())))
}

/// Returns the router for rides.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rides).post(create_ride))
        .route("/{ride_id}/queue", get(get_ride_queue))
}
