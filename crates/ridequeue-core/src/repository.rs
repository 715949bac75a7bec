//! Event log abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::{AggregateKind, EventRecord};

/// Append-only, ordered storage of immutable event records.
///
/// There is no deletion or compaction: the log is the system of record and
/// every aggregate state is derived from it.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Appends a single record. The record is durable once this returns `Ok`.
    async fn append(&self, record: &EventRecord) -> Result<(), DomainError>;

    /// Loads every record for `(source_id, aggregate_root)` in ascending
    /// `occurred_at` order, ties broken by append order.
    ///
    /// Records of any other `(source_id, aggregate_root)` pair are never returned.
    async fn events_for(
        &self,
        source_id: Uuid,
        aggregate_root: AggregateKind,
    ) -> Result<Vec<EventRecord>, DomainError>;
}
