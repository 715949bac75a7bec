//! Commands for the Ride Queue context.

use ridequeue_core::command::Command;
use uuid::Uuid;

/// Command to add a customer to a ride's queue.
#[derive(Debug, Clone)]
pub struct RecordRideJoin {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The ride whose queue grows.
    pub ride_id: Uuid,
    /// The customer joining.
    pub customer_id: Uuid,
}

impl Command for RecordRideJoin {
    fn command_type(&self) -> &'static str {
        "rides.record_join"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to remove a customer from a ride's queue.
#[derive(Debug, Clone)]
pub struct RecordRideLeave {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The ride whose queue shrinks.
    pub ride_id: Uuid,
    /// The customer leaving.
    pub customer_id: Uuid,
}

impl Command for RecordRideLeave {
    fn command_type(&self) -> &'static str {
        "rides.record_leave"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
