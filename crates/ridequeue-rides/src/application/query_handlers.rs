//! Query handlers for the Ride Queue context.

use ridequeue_core::aggregate::load_current_state;
use ridequeue_core::cache::StateCache;
use ridequeue_core::catalog::Ride;
use ridequeue_core::clock::Clock;
use ridequeue_core::error::DomainError;
use ridequeue_core::repository::EventLog;

use crate::domain::aggregates::RideQueueState;

/// Returns the current queue state of `ride`. Never appends.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the event log cannot be read.
pub async fn get_ride_queue_state(
    ride: &Ride,
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
) -> Result<RideQueueState, DomainError> {
    load_current_state(ride.id, ride, clock, event_log, cache).await
}
