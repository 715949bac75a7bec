//! Routes for customers and their queue membership.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use ridequeue_core::catalog::Customer;
use ridequeue_core::clock::Clock;
use ridequeue_customers::domain::aggregates::CustomerQueueState;
use ridequeue_queueing::application::command_handlers::{
    QueueingOutcome, handle_join_queue, handle_leave_queue,
};
use ridequeue_queueing::application::query_handlers;
use ridequeue_queueing::domain::commands::{JoinQueue, LeaveQueue};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use super::rides::RideQueueResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{customer_id}/queue.
#[derive(Debug, Deserialize)]
pub struct JoinQueueRequest {
    /// The ride to queue for.
    pub ride_id: Uuid,
}

/// A customer's park visit.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    /// Customer identifier.
    pub id: Uuid,
    /// When the customer entered.
    pub entered_at: DateTime<Utc>,
    /// When the customer left, if they have.
    pub exited_at: Option<DateTime<Utc>>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            entered_at: customer.entered_at,
            exited_at: customer.exited_at,
        }
    }
}

/// Response body for a join or leave.
#[derive(Debug, Serialize)]
pub struct QueueingResponse {
    /// Correlation ID shared by the appended events.
    pub correlation_id: Uuid,
    /// The ride's queue after the operation.
    pub ride: RideQueueResponse,
    /// The customer's queue state after the operation.
    pub customer: CustomerQueueState,
}

impl QueueingResponse {
    fn new(correlation_id: Uuid, outcome: &QueueingOutcome, now: DateTime<Utc>) -> Self {
        Self {
            correlation_id,
            ride: RideQueueResponse::from_state(&outcome.ride, now),
            customer: outcome.customer.clone(),
        }
    }
}

/// GET /
#[instrument(skip(state))]
async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = state.customers.list_customers().await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// POST /enter
#[instrument(skip(state))]
async fn enter(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let customer = Customer::entering(state.clock.now());
    state.customers.add_customer(&customer).await?;

    info!(customer_id = %customer.id, "customer entered");

    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// POST /{customer_id}/exit
#[instrument(skip(state))]
async fn exit(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = state
        .customers
        .record_exit(customer_id, state.clock.now())
        .await?;

    info!(%customer_id, "customer exited");

    Ok(Json(customer.into()))
}

/// GET /{customer_id}/queue
#[instrument(skip(state))]
async fn get_customer_queue(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<CustomerQueueState>, ApiError> {
    let queue = query_handlers::get_customer_queue_state(
        customer_id,
        state.clock.as_ref(),
        &*state.event_log,
        &state.cache,
        &*state.customers,
    )
    .await?;

    Ok(Json(queue))
}

/// POST /{customer_id}/queue
#[instrument(skip(state, request), fields(ride_id = %request.ride_id))]
async fn join_queue(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(request): Json<JoinQueueRequest>,
) -> Result<Json<QueueingResponse>, ApiError> {
    let command = JoinQueue {
        correlation_id: Uuid::new_v4(),
        customer_id,
        ride_id: request.ride_id,
    };

    info!(correlation_id = %command.correlation_id, "handling join_queue command");

    let outcome = handle_join_queue(
        &command,
        state.clock.as_ref(),
        &*state.event_log,
        &state.cache,
        &*state.rides,
        &*state.customers,
    )
    .await?;

    Ok(Json(QueueingResponse::new(
        command.correlation_id,
        &outcome,
        state.clock.now(),
    )))
}

/// POST /{customer_id}/unqueue
#[instrument(skip(state))]
async fn leave_queue(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<QueueingResponse>, ApiError> {
    let command = LeaveQueue {
        correlation_id: Uuid::new_v4(),
        customer_id,
    };

    info!(correlation_id = %command.correlation_id, "handling leave_queue command");

    let outcome = handle_leave_queue(
        &command,
        state.clock.as_ref(),
        &*state.event_log,
        &state.cache,
        &*state.rides,
        &*state.customers,
    )
    .await?;

    Ok(Json(QueueingResponse::new(
        command.correlation_id,
        &outcome,
        state.clock.now(),
    )))
}

/// Returns the router for customers.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers))
        .route("/enter", post(enter))
        .route("/{customer_id}/exit", post(exit))
        .route(
            "/{customer_id}/queue",
            get(get_customer_queue).post(join_queue),
        )
        .route("/{customer_id}/unqueue", post(leave_queue))
}
