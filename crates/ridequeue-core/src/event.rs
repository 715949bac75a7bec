//! Domain event abstractions.
//!
//! Events are persisted as [`EventRecord`]s. Each aggregate defines a closed
//! event enum implementing [`DomainEvent`]; the `name` and `aggregate_root`
//! columns of a record are only the serialized discriminator of that enum.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Discriminator identifying which aggregate an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateKind {
    /// The ride queue aggregate.
    Ride,
    /// The customer queue aggregate.
    Customer,
}

impl AggregateKind {
    /// Returns the persisted discriminator value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ride => "Ride",
            Self::Customer => "Customer",
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ride" => Ok(Self::Ride),
            "Customer" => Ok(Self::Customer),
            other => Err(DomainError::Infrastructure(format!(
                "unknown aggregate root: {other}"
            ))),
        }
    }
}

/// Stored, immutable representation of a domain event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// The ride or customer that owns this event.
    pub source_id: Uuid,
    /// Which aggregate the event belongs to.
    pub aggregate_root: AggregateKind,
    /// Event kind name, used to select the variant on decode.
    pub name: String,
    /// Event timestamp; ordering key and default validity start.
    pub occurred_at: DateTime<Utc>,
    /// When the effect of this event naturally expires, if ever.
    pub valid_until: Option<DateTime<Utc>>,
    /// Correlation ID shared by every event appended for one request.
    pub correlation_id: Uuid,
    /// Serialized event-specific data.
    pub payload: serde_json::Value,
}

impl EventRecord {
    /// Returns `true` if the event's effect has lapsed at `now`.
    #[must_use]
    pub fn has_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| until < now)
    }
}

/// Trait that all domain events implement.
///
/// Implementors are closed enums over a fixed set of event kinds. Encoding
/// and decoding are the enum's own contract; replay matches the decoded enum
/// exhaustively.
pub trait DomainEvent: Sized + Send + Sync + fmt::Debug {
    /// The aggregate kind every variant belongs to.
    const AGGREGATE: AggregateKind;

    /// Returns the event kind name.
    fn name(&self) -> &'static str;

    /// Returns the identifier of the owning ride or customer.
    fn source_id(&self) -> Uuid;

    /// Returns the event timestamp.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Returns when the event's effect expires, if it does.
    fn valid_until(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Serializes the variant's payload.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the payload cannot be encoded.
    fn encode_payload(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Decodes a payload for the variant called `name`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` for unknown names or malformed payloads.
    fn decode(name: &str, payload: &serde_json::Value) -> Result<Self, DomainError>;

    /// Builds the record that is appended to the event log.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload cannot be encoded.
    fn to_record(&self, correlation_id: Uuid) -> Result<EventRecord, DomainError> {
        let payload = self.encode_payload().map_err(|e| {
            DomainError::Infrastructure(format!("event serialization failed: {e}"))
        })?;
        Ok(EventRecord {
            event_id: Uuid::now_v7(),
            source_id: self.source_id(),
            aggregate_root: Self::AGGREGATE,
            name: self.name().to_owned(),
            occurred_at: self.occurred_at(),
            valid_until: self.valid_until(),
            correlation_id,
            payload,
        })
    }

    /// Decodes a stored record back into the event enum.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the record belongs to another
    /// aggregate kind or cannot be decoded.
    fn from_record(record: &EventRecord) -> Result<Self, DomainError> {
        if record.aggregate_root != Self::AGGREGATE {
            return Err(DomainError::Infrastructure(format!(
                "event {} belongs to aggregate {}, expected {}",
                record.event_id,
                record.aggregate_root,
                Self::AGGREGATE
            )));
        }
        Self::decode(&record.name, &record.payload)
    }
}

/// Decodes a JSON payload into a variant struct.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the payload does not match `T`.
pub fn decode_payload<T>(name: &str, payload: &serde_json::Value) -> Result<T, DomainError>
where
    T: for<'de> Deserialize<'de>,
{
    T::deserialize(payload).map_err(|e| {
        DomainError::Infrastructure(format!("event deserialization failed for {name}: {e}"))
    })
}
