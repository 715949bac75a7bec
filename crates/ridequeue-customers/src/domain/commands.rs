//! Commands for the Customer Queue context.

use chrono::{DateTime, Utc};
use ridequeue_core::command::Command;
use ridequeue_core::error::DomainError;
use uuid::Uuid;

/// The time range a queued customer occupies, from joining until the end of
/// their ride cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl QueueWindow {
    /// Creates a window.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless `end` is after `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        if end <= start {
            return Err(DomainError::Validation(format!(
                "queue window must end after it starts ({start} .. {end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// When the customer joined.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// When the customer's ride cycle ends.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Command to mark a customer as queueing for a ride.
#[derive(Debug, Clone)]
pub struct RecordCustomerJoin {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The customer joining.
    pub customer_id: Uuid,
    /// The ride they queue for.
    pub ride_id: Uuid,
    /// The slot they occupy.
    pub window: QueueWindow,
}

impl Command for RecordCustomerJoin {
    fn command_type(&self) -> &'static str {
        "customers.record_join"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to mark a customer as no longer queueing.
#[derive(Debug, Clone)]
pub struct RecordCustomerLeave {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The customer leaving.
    pub customer_id: Uuid,
}

impl Command for RecordCustomerLeave {
    fn command_type(&self) -> &'static str {
        "customers.record_leave"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
