//! Domain events for the Ride Queue context.

use chrono::{DateTime, Utc};
use ridequeue_core::error::DomainError;
use ridequeue_core::event::{AggregateKind, DomainEvent, decode_payload};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted when a customer joins a ride's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideCustomerQueued {
    /// The ride identifier.
    pub ride_id: Uuid,
    /// The customer who joined.
    pub customer_id: Uuid,
    /// When the customer joined.
    pub from: DateTime<Utc>,
    /// When the customer's ride cycle ends; the join stops counting after this.
    pub to: DateTime<Utc>,
}

/// Emitted when a customer leaves a ride's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideCustomerUnqueued {
    /// The ride identifier.
    pub ride_id: Uuid,
    /// The customer who left.
    pub customer_id: Uuid,
    /// When the customer left.
    pub at: DateTime<Utc>,
}

/// Event name for [`RideCustomerQueued`].
pub const RIDE_CUSTOMER_QUEUED: &str = "RideCustomerQueued";

/// Event name for [`RideCustomerUnqueued`].
pub const RIDE_CUSTOMER_UNQUEUED: &str = "RideCustomerUnQueued";

/// Events of the ride queue aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RideEvent {
    /// A customer joined the queue.
    CustomerQueued(RideCustomerQueued),
    /// A customer left the queue.
    CustomerUnqueued(RideCustomerUnqueued),
}

impl DomainEvent for RideEvent {
    const AGGREGATE: AggregateKind = AggregateKind::Ride;

    fn name(&self) -> &'static str {
        match self {
            Self::CustomerQueued(_) => RIDE_CUSTOMER_QUEUED,
            Self::CustomerUnqueued(_) => RIDE_CUSTOMER_UNQUEUED,
        }
    }

    fn source_id(&self) -> Uuid {
        match self {
            Self::CustomerQueued(e) => e.ride_id,
            Self::CustomerUnqueued(e) => e.ride_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::CustomerQueued(e) => e.from,
            Self::CustomerUnqueued(e) => e.at,
        }
    }

    fn valid_until(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::CustomerQueued(e) => Some(e.to),
            Self::CustomerUnqueued(_) => None,
        }
    }

    fn encode_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::CustomerQueued(e) => serde_json::to_value(e),
            Self::CustomerUnqueued(e) => serde_json::to_value(e),
        }
    }

    fn decode(name: &str, payload: &serde_json::Value) -> Result<Self, DomainError> {
        match name {
            RIDE_CUSTOMER_QUEUED => decode_payload(name, payload).map(Self::CustomerQueued),
            RIDE_CUSTOMER_UNQUEUED => decode_payload(name, payload).map(Self::CustomerUnqueued),
            other => Err(DomainError::Infrastructure(format!(
                "unknown ride event: {other}"
            ))),
        }
    }
}
