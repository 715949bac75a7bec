//! Command handlers for the Customer Queue context.

use ridequeue_core::aggregate::{Aggregate, load_current_state};
use ridequeue_core::cache::{CacheKey, StateCache};
use ridequeue_core::clock::Clock;
use ridequeue_core::error::DomainError;
use ridequeue_core::event::{AggregateKind, DomainEvent, EventRecord};
use ridequeue_core::repository::EventLog;
use tracing::info;

use crate::domain::aggregates::CustomerQueueState;
use crate::domain::commands::{RecordCustomerJoin, RecordCustomerLeave};
use crate::domain::events::{CustomerEvent, CustomerQueued, CustomerUnqueued};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct CustomerCommandResult {
    /// Customer queue state after the event, computed incrementally.
    pub state: CustomerQueueState,
    /// The record that was appended.
    pub record: EventRecord,
}

async fn append_and_invalidate(
    event: &CustomerEvent,
    correlation_id: uuid::Uuid,
    event_log: &dyn EventLog,
    cache: &StateCache,
) -> Result<EventRecord, DomainError> {
    let record = event.to_record(correlation_id)?;
    event_log.append(&record).await?;
    cache.delete(&CacheKey::new(AggregateKind::Customer, event.source_id()));
    Ok(record)
}

/// Handles the `RecordCustomerJoin` command.
///
/// # Errors
///
/// Returns `DomainError::AlreadyQueued` if the customer still holds an active
/// window, or another `DomainError` if loading or appending fails.
pub async fn handle_record_join(
    command: &RecordCustomerJoin,
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
) -> Result<CustomerCommandResult, DomainError> {
    let mut state: CustomerQueueState =
        load_current_state(command.customer_id, &(), clock, event_log, cache).await?;
    if state.is_queueing {
        return Err(DomainError::AlreadyQueued(command.customer_id));
    }

    let event = CustomerEvent::Queued(CustomerQueued {
        customer_id: command.customer_id,
        ride_id: command.ride_id,
        from: command.window.start(),
        to: command.window.end(),
    });
    let record = append_and_invalidate(&event, command.correlation_id, event_log, cache).await?;

    let now = clock.now();
    state.apply(&event, &(), now);
    state.observe(now);

    info!(
        customer_id = %command.customer_id,
        ride_id = %command.ride_id,
        correlation_id = %command.correlation_id,
        window_end = %command.window.end(),
        "customer started queueing"
    );

    Ok(CustomerCommandResult { state, record })
}

/// Handles the `RecordCustomerLeave` command.
///
/// # Errors
///
/// Returns `DomainError::NotQueued` if the customer holds no active window,
/// or another `DomainError` if loading or appending fails.
pub async fn handle_record_leave(
    command: &RecordCustomerLeave,
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
) -> Result<CustomerCommandResult, DomainError> {
    let mut state: CustomerQueueState =
        load_current_state(command.customer_id, &(), clock, event_log, cache).await?;
    if !state.is_queueing {
        return Err(DomainError::NotQueued(command.customer_id));
    }

    let now = clock.now();
    let event = CustomerEvent::Unqueued(CustomerUnqueued {
        customer_id: command.customer_id,
        at: now,
    });
    let record = append_and_invalidate(&event, command.correlation_id, event_log, cache).await?;
    state.apply(&event, &(), now);

    info!(
        customer_id = %command.customer_id,
        correlation_id = %command.correlation_id,
        "customer stopped queueing"
    );

    Ok(CustomerCommandResult { state, record })
}
