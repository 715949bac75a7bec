//! Command handlers for the Ride Queue context.
//!
//! Each handler loads the current state (cache or replay), appends exactly
//! one event, then drops the ride's cache entry so the next read re-derives
//! state from the log.

use ridequeue_core::aggregate::{Aggregate, load_current_state};
use ridequeue_core::cache::{CacheKey, StateCache};
use ridequeue_core::catalog::Ride;
use ridequeue_core::clock::Clock;
use ridequeue_core::error::DomainError;
use ridequeue_core::event::{AggregateKind, DomainEvent, EventRecord};
use ridequeue_core::repository::EventLog;
use tracing::info;

use crate::domain::aggregates::RideQueueState;
use crate::domain::commands::{RecordRideJoin, RecordRideLeave};
use crate::domain::events::{RideCustomerQueued, RideCustomerUnqueued, RideEvent};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct RideCommandResult {
    /// Ride queue state after the event, computed incrementally.
    pub state: RideQueueState,
    /// The record that was appended.
    pub record: EventRecord,
}

fn ensure_same_ride(command_ride_id: uuid::Uuid, ride: &Ride) -> Result<(), DomainError> {
    if command_ride_id == ride.id {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "command targets ride {command_ride_id} but ride {} was supplied",
            ride.id
        )))
    }
}

async fn append_and_invalidate(
    event: &RideEvent,
    correlation_id: uuid::Uuid,
    event_log: &dyn EventLog,
    cache: &StateCache,
) -> Result<EventRecord, DomainError> {
    let record = event.to_record(correlation_id)?;
    event_log.append(&record).await?;
    cache.delete(&CacheKey::new(AggregateKind::Ride, event.source_id()));
    Ok(record)
}

/// Handles the `RecordRideJoin` command.
///
/// The join stays valid until the customer's cycle ends: the service time
/// the join itself produces plus one cycle.
///
/// # Errors
///
/// Returns `DomainError` if loading, encoding or appending fails.
pub async fn handle_record_join(
    command: &RecordRideJoin,
    ride: &Ride,
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
) -> Result<RideCommandResult, DomainError> {
    ensure_same_ride(command.ride_id, ride)?;
    let mut state: RideQueueState =
        load_current_state(ride.id, ride, clock, event_log, cache).await?;

    let now = clock.now();
    let service_time = state.service_time_after_join(ride, now);
    let event = RideEvent::CustomerQueued(RideCustomerQueued {
        ride_id: ride.id,
        customer_id: command.customer_id,
        from: now,
        to: service_time + ride.cycle_duration,
    });

    let record = append_and_invalidate(&event, command.correlation_id, event_log, cache).await?;
    state.apply(&event, ride, now);

    info!(
        ride_id = %ride.id,
        customer_id = %command.customer_id,
        correlation_id = %command.correlation_id,
        queue_count = state.queue_count,
        "customer joined ride queue"
    );

    Ok(RideCommandResult { state, record })
}

/// Handles the `RecordRideLeave` command.
///
/// # Errors
///
/// Returns `DomainError::QueueEmpty` if nobody is waiting for the ride,
/// `DomainError::NotQueued` if the customer holds no counted seat, or another
/// `DomainError` if loading, encoding or appending fails.
pub async fn handle_record_leave(
    command: &RecordRideLeave,
    ride: &Ride,
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
) -> Result<RideCommandResult, DomainError> {
    ensure_same_ride(command.ride_id, ride)?;
    let mut state: RideQueueState =
        load_current_state(ride.id, ride, clock, event_log, cache).await?;
    if state.queue_count == 0 {
        return Err(DomainError::QueueEmpty(ride.id));
    }
    if !state.is_waiting(command.customer_id) {
        return Err(DomainError::NotQueued(command.customer_id));
    }

    let now = clock.now();
    let event = RideEvent::CustomerUnqueued(RideCustomerUnqueued {
        ride_id: ride.id,
        customer_id: command.customer_id,
        at: now,
    });

    let record = append_and_invalidate(&event, command.correlation_id, event_log, cache).await?;
    state.apply(&event, ride, now);

    info!(
        ride_id = %ride.id,
        customer_id = %command.customer_id,
        correlation_id = %command.correlation_id,
        queue_count = state.queue_count,
        "customer left ride queue"
    );

    Ok(RideCommandResult { state, record })
}
