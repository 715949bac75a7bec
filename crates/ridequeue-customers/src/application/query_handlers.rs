//! Query handlers for the Customer Queue context.

use ridequeue_core::aggregate::load_current_state;
use ridequeue_core::cache::StateCache;
use ridequeue_core::clock::Clock;
use ridequeue_core::error::DomainError;
use ridequeue_core::repository::EventLog;
use uuid::Uuid;

use crate::domain::aggregates::CustomerQueueState;

/// Returns the current queue state of a customer, with lapsed windows
/// already expired.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the event log cannot be read.
pub async fn get_customer_queue_state(
    customer_id: Uuid,
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
) -> Result<CustomerQueueState, DomainError> {
    load_current_state(customer_id, &(), clock, event_log, cache).await
}
