//! Undo actions for completed orchestration steps.

use ridequeue_core::cache::StateCache;
use ridequeue_core::catalog::Ride;
use ridequeue_core::clock::Clock;
use ridequeue_core::error::DomainError;
use ridequeue_core::repository::EventLog;
use ridequeue_rides::application::command_handlers::handle_record_leave;
use ridequeue_rides::domain::commands::RecordRideLeave;
use tracing::{info, warn};
use uuid::Uuid;

/// The undo action for one step that already took effect.
#[derive(Debug, Clone)]
pub enum Compensation {
    /// A customer was added to a ride's queue; remove them again.
    UndoRideJoin {
        /// The ride whose queue grew.
        ride: Ride,
        /// The customer who was added.
        customer_id: Uuid,
    },
}

impl Compensation {
    async fn run(
        &self,
        correlation_id: Uuid,
        clock: &dyn Clock,
        event_log: &dyn EventLog,
        cache: &StateCache,
    ) -> Result<(), DomainError> {
        match self {
            Self::UndoRideJoin { ride, customer_id } => {
                let command = RecordRideLeave {
                    correlation_id,
                    ride_id: ride.id,
                    customer_id: *customer_id,
                };
                handle_record_leave(&command, ride, clock, event_log, cache).await?;
                info!(ride_id = %ride.id, customer_id = %customer_id, "undid ride-side join");
                Ok(())
            }
        }
    }
}

/// Completed steps of one orchestrated operation, most recent last.
#[derive(Debug)]
pub struct CompensationLog {
    correlation_id: Uuid,
    steps: Vec<Compensation>,
}

impl CompensationLog {
    /// Creates an empty log. Undo events carry `correlation_id`.
    #[must_use]
    pub fn new(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            steps: Vec::new(),
        }
    }

    /// Records the undo action for a step that just succeeded.
    pub fn record(&mut self, step: Compensation) {
        self.steps.push(step);
    }

    /// Runs every undo action, newest first.
    ///
    /// Every action is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered.
    pub async fn unwind(
        self,
        clock: &dyn Clock,
        event_log: &dyn EventLog,
        cache: &StateCache,
    ) -> Result<(), DomainError> {
        let mut first_failure = None;
        for step in self.steps.iter().rev() {
            if let Err(error) = step.run(self.correlation_id, clock, event_log, cache).await {
                warn!(correlation_id = %self.correlation_id, ?step, %error, "compensation step failed");
                first_failure.get_or_insert(error);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }
}
