//! `PostgreSQL` implementation of the `EventLog` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use ridequeue_core::error::DomainError;
use ridequeue_core::event::{AggregateKind, EventRecord};
use ridequeue_core::repository::EventLog;

/// PostgreSQL-backed event log.
#[derive(Debug, Clone)]
pub struct PgEventLog {
    pool: PgPool,
}

impl PgEventLog {
    /// Creates a new `PgEventLog`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn infrastructure(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}

fn record_from_row(row: &PgRow) -> Result<EventRecord, DomainError> {
    let aggregate_root: String = row.try_get("aggregate_root").map_err(infrastructure)?;
    Ok(EventRecord {
        event_id: row.try_get("event_id").map_err(infrastructure)?,
        source_id: row.try_get("source_id").map_err(infrastructure)?,
        aggregate_root: aggregate_root.parse()?,
        name: row.try_get("name").map_err(infrastructure)?,
        occurred_at: row.try_get::<DateTime<Utc>, _>("occurred_at").map_err(infrastructure)?,
        valid_until: row
            .try_get::<Option<DateTime<Utc>>, _>("valid_until")
            .map_err(infrastructure)?,
        correlation_id: row.try_get("correlation_id").map_err(infrastructure)?,
        payload: row.try_get("payload").map_err(infrastructure)?,
    })
}

#[async_trait]
impl EventLog for PgEventLog {
    async fn append(&self, record: &EventRecord) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO queue_events
                (event_id, source_id, aggregate_root, name, occurred_at, valid_until, correlation_id, payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(record.event_id)
        .bind(record.source_id)
        .bind(record.aggregate_root.as_str())
        .bind(&record.name)
        .bind(record.occurred_at)
        .bind(record.valid_until)
        .bind(record.correlation_id)
        .bind(&record.payload)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;

        debug!(
            event_id = %record.event_id,
            source_id = %record.source_id,
            aggregate_root = %record.aggregate_root,
            name = %record.name,
            "appended event"
        );
        Ok(())
    }

    async fn events_for(
        &self,
        source_id: Uuid,
        aggregate_root: AggregateKind,
    ) -> Result<Vec<EventRecord>, DomainError> {
        let rows = sqlx::query(
            r"
            SELECT event_id, source_id, aggregate_root, name, occurred_at, valid_until, correlation_id, payload
            FROM queue_events
            WHERE source_id = $1 AND aggregate_root = $2
            ORDER BY occurred_at ASC, seq ASC
            ",
        )
        .bind(source_id)
        .bind(aggregate_root.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.iter().map(record_from_row).collect()
    }
}
