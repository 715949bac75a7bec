//! Domain error types.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Kind of reference entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A ride.
    Ride,
    /// A customer.
    Customer,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ride => f.write_str("ride"),
            Self::Customer => f.write_str("customer"),
        }
    }
}

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced ride or customer does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Which kind of entity was looked up.
        entity: Entity,
        /// The identifier that was looked up.
        id: Uuid,
    },

    /// The customer already occupies an unexpired queue window.
    #[error("customer {0} is already in a queue or riding")]
    AlreadyQueued(Uuid),

    /// The customer is not in any queue.
    #[error("customer {0} is not in any queue")]
    NotQueued(Uuid),

    /// A leave was requested on a ride whose queue is empty.
    #[error("ride {0} has no one in queue to remove")]
    QueueEmpty(Uuid),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for a missing ride.
    #[must_use]
    pub fn ride_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: Entity::Ride,
            id,
        }
    }

    /// Shorthand for a missing customer.
    #[must_use]
    pub fn customer_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: Entity::Customer,
            id,
        }
    }

    /// Returns `true` for domain precondition violations.
    ///
    /// These are surfaced to the caller as-is and are not logged as failures.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::AlreadyQueued(_) | Self::NotQueued(_) | Self::QueueEmpty(_)
        )
    }
}
