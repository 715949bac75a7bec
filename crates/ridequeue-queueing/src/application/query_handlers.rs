//! Query handlers for queueing orchestration.
//!
//! These resolve the reference data first, so an unknown id is reported as
//! `NotFound` instead of an empty derived state.

use ridequeue_core::cache::StateCache;
use ridequeue_core::catalog::{CustomerCatalog, Ride, RideCatalog};
use ridequeue_core::clock::Clock;
use ridequeue_core::error::DomainError;
use ridequeue_core::repository::EventLog;
use ridequeue_customers::application::query_handlers::get_customer_queue_state as customer_state;
use ridequeue_customers::domain::aggregates::CustomerQueueState;
use ridequeue_rides::application::query_handlers::get_ride_queue_state as ride_state;
use ridequeue_rides::domain::aggregates::RideQueueState;
use uuid::Uuid;

/// Returns the queue state of ride `ride_id`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown ride, or
/// `DomainError::Infrastructure` if a lookup or the event log fails.
pub async fn get_ride_queue_state(
    ride_id: Uuid,
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
    rides: &dyn RideCatalog,
) -> Result<RideQueueState, DomainError> {
    let ride = rides.get_ride(ride_id).await?;
    ride_state(&ride, clock, event_log, cache).await
}

/// Returns the queue state of customer `customer_id`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown customer, or
/// `DomainError::Infrastructure` if a lookup or the event log fails.
pub async fn get_customer_queue_state(
    customer_id: Uuid,
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
    customers: &dyn CustomerCatalog,
) -> Result<CustomerQueueState, DomainError> {
    customers.get_customer(customer_id).await?;
    customer_state(customer_id, clock, event_log, cache).await
}

/// Returns every ride together with its current queue state.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if a lookup or the event log fails.
pub async fn list_ride_queues(
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
    rides: &dyn RideCatalog,
) -> Result<Vec<(Ride, RideQueueState)>, DomainError> {
    let mut listing = Vec::new();
    for ride in rides.list_rides().await? {
        let state = ride_state(&ride, clock, event_log, cache).await?;
        listing.push((ride, state));
    }
    Ok(listing)
}
