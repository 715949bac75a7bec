//! Domain events for the Customer Queue context.

use chrono::{DateTime, Utc};
use ridequeue_core::error::DomainError;
use ridequeue_core::event::{AggregateKind, DomainEvent, decode_payload};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted when a customer starts queueing for a ride.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerQueued {
    /// The customer identifier.
    pub customer_id: Uuid,
    /// The ride queued for.
    pub ride_id: Uuid,
    /// Window start.
    pub from: DateTime<Utc>,
    /// Window end.
    pub to: DateTime<Utc>,
}

/// Emitted when a customer stops queueing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUnqueued {
    /// The customer identifier.
    pub customer_id: Uuid,
    /// When the customer left the queue.
    pub at: DateTime<Utc>,
}

/// Event name for [`CustomerQueued`].
pub const CUSTOMER_QUEUED: &str = "CustomerQueued";

/// Event name for [`CustomerUnqueued`].
pub const CUSTOMER_UNQUEUED: &str = "CustomerUnQueued";

/// Events of the customer queue aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerEvent {
    /// The customer joined a ride queue.
    Queued(CustomerQueued),
    /// The customer left their queue.
    Unqueued(CustomerUnqueued),
}

impl DomainEvent for CustomerEvent {
    const AGGREGATE: AggregateKind = AggregateKind::Customer;

    fn name(&self) -> &'static str {
        match self {
            Self::Queued(_) => CUSTOMER_QUEUED,
            Self::Unqueued(_) => CUSTOMER_UNQUEUED,
        }
    }

    fn source_id(&self) -> Uuid {
        match self {
            Self::Queued(e) => e.customer_id,
            Self::Unqueued(e) => e.customer_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::Queued(e) => e.from,
            Self::Unqueued(e) => e.at,
        }
    }

    fn valid_until(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Queued(e) => Some(e.to),
            Self::Unqueued(_) => None,
        }
    }

    fn encode_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Queued(e) => serde_json::to_value(e),
            Self::Unqueued(e) => serde_json::to_value(e),
        }
    }

    fn decode(name: &str, payload: &serde_json::Value) -> Result<Self, DomainError> {
        match name {
            CUSTOMER_QUEUED => decode_payload(name, payload).map(Self::Queued),
            CUSTOMER_UNQUEUED => decode_payload(name, payload).map(Self::Unqueued),
            other => Err(DomainError::Infrastructure(format!(
                "unknown customer event: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    #[test]
    fn test_unqueued_event_record_has_no_validity_bound() {
        // Arrange
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let event = CustomerEvent::Unqueued(CustomerUnqueued {
            customer_id: Uuid::new_v4(),
            at,
        });

        // Act
        let record = event.to_record(Uuid::new_v4()).unwrap();

        // Assert
        assert_eq!(record.aggregate_root, AggregateKind::Customer);
        assert_eq!(record.name, CUSTOMER_UNQUEUED);
        assert_eq!(record.valid_until, None);
        assert_eq!(CustomerEvent::from_record(&record).unwrap(), event);
    }

    #[test]
    fn test_queued_payload_is_the_variant_struct_as_json() {
        // Arrange
        let from = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let queued = CustomerQueued {
            customer_id: Uuid::new_v4(),
            ride_id: Uuid::new_v4(),
            from,
            to: from + TimeDelta::minutes(20),
        };
        let event = CustomerEvent::Queued(queued.clone());

        // Act
        let record = event.to_record(Uuid::new_v4()).unwrap();

        // Assert
        assert_eq!(record.payload, serde_json::to_value(&queued).unwrap());
        assert_eq!(record.valid_until, Some(queued.to));
    }

    #[test]
    fn test_decode_reports_malformed_payload_as_infrastructure_error() {
        let result = CustomerEvent::decode(CUSTOMER_QUEUED, &serde_json::json!({"at": 1}));

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
