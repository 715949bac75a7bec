//! Commands for queueing orchestration.

use ridequeue_core::command::Command;
use uuid::Uuid;

/// Command for a customer to join a ride's queue.
#[derive(Debug, Clone)]
pub struct JoinQueue {
    /// The correlation ID shared by every event this join appends.
    pub correlation_id: Uuid,
    /// The customer joining.
    pub customer_id: Uuid,
    /// The ride to queue for.
    pub ride_id: Uuid,
}

impl Command for JoinQueue {
    fn command_type(&self) -> &'static str {
        "queueing.join_queue"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command for a customer to leave whatever queue they are in.
#[derive(Debug, Clone)]
pub struct LeaveQueue {
    /// The correlation ID shared by every event this leave appends.
    pub correlation_id: Uuid,
    /// The customer leaving.
    pub customer_id: Uuid,
}

impl Command for LeaveQueue {
    fn command_type(&self) -> &'static str {
        "queueing.leave_queue"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
