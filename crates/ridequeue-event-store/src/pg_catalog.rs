//! `PostgreSQL` implementation of the ride and customer catalogs.

use std::num::NonZeroU32;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use ridequeue_core::catalog::{Customer, CustomerCatalog, Ride, RideCatalog};
use ridequeue_core::error::DomainError;

use crate::pg_event_log::infrastructure;

/// PostgreSQL-backed reference data.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Creates a new `PgCatalog`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn ride_from_row(row: &PgRow) -> Result<Ride, DomainError> {
    let capacity: i32 = row.try_get("capacity").map_err(infrastructure)?;
    let cycle_secs: i64 = row.try_get("cycle_duration_secs").map_err(infrastructure)?;
    let capacity = u32::try_from(capacity)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| DomainError::Infrastructure(format!("invalid stored capacity {capacity}")))?;
    let cycle_duration = TimeDelta::try_seconds(cycle_secs).ok_or_else(|| {
        DomainError::Infrastructure(format!("invalid stored cycle duration {cycle_secs}"))
    })?;

    Ok(Ride {
        id: row.try_get("id").map_err(infrastructure)?,
        name: row.try_get("name").map_err(infrastructure)?,
        description: row.try_get("description").map_err(infrastructure)?,
        capacity,
        cycle_duration,
    })
}

fn customer_from_row(row: &PgRow) -> Result<Customer, DomainError> {
    Ok(Customer {
        id: row.try_get("id").map_err(infrastructure)?,
        entered_at: row.try_get("entered_at").map_err(infrastructure)?,
        exited_at: row.try_get("exited_at").map_err(infrastructure)?,
    })
}

#[async_trait]
impl RideCatalog for PgCatalog {
    async fn get_ride(&self, id: Uuid) -> Result<Ride, DomainError> {
        let row = sqlx::query(
            "SELECT id, name, description, capacity, cycle_duration_secs FROM rides WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;

        match row {
            Some(row) => ride_from_row(&row),
            None => Err(DomainError::ride_not_found(id)),
        }
    }

    async fn list_rides(&self) -> Result<Vec<Ride>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, name, description, capacity, cycle_duration_secs FROM rides ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.iter().map(ride_from_row).collect()
    }

    async fn add_ride(&self, ride: &Ride) -> Result<(), DomainError> {
        let capacity = i32::try_from(ride.capacity.get())
            .map_err(|_| DomainError::Validation("ride capacity is too large".into()))?;
        sqlx::query(
            r"
            INSERT INTO rides (id, name, description, capacity, cycle_duration_secs)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(ride.id)
        .bind(&ride.name)
        .bind(&ride.description)
        .bind(capacity)
        .bind(ride.cycle_duration.num_seconds())
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(())
    }
}

#[async_trait]
impl CustomerCatalog for PgCatalog {
    async fn get_customer(&self, id: Uuid) -> Result<Customer, DomainError> {
        let row = sqlx::query("SELECT id, entered_at, exited_at FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?;

        match row {
            Some(row) => customer_from_row(&row),
            None => Err(DomainError::customer_not_found(id)),
        }
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, entered_at, exited_at FROM customers WHERE exited_at IS NULL ORDER BY entered_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.iter().map(customer_from_row).collect()
    }

    async fn add_customer(&self, customer: &Customer) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO customers (id, entered_at, exited_at) VALUES ($1, $2, $3)")
            .bind(customer.id)
            .bind(customer.entered_at)
            .bind(customer.exited_at)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(())
    }

    async fn record_exit(&self, id: Uuid, at: DateTime<Utc>) -> Result<Customer, DomainError> {
        let row = sqlx::query(
            r"
            UPDATE customers SET exited_at = $2
            WHERE id = $1
            RETURNING id, entered_at, exited_at
            ",
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;

        match row {
            Some(row) => customer_from_row(&row),
            None => Err(DomainError::customer_not_found(id)),
        }
    }
}
