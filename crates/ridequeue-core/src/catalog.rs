//! Reference data supplied to the aggregates as read-only input.
//!
//! Rides and customers are owned by the persistence layer. The queue
//! aggregates only ever read them.

use std::num::NonZeroU32;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// A ride with a fixed per-cycle throughput.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ride {
    /// Ride identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Number of riders served together in one cycle (one batch).
    pub capacity: NonZeroU32,
    /// Duration of one service cycle.
    pub cycle_duration: TimeDelta,
}

impl Ride {
    /// Creates a new ride with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank, the capacity is
    /// zero or the cycle is shorter than one second.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        capacity: u32,
        cycle_duration: TimeDelta,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::Validation("ride name must not be empty".into()));
        }
        let capacity = NonZeroU32::new(capacity)
            .ok_or_else(|| DomainError::Validation("ride capacity must be at least 1".into()))?;
        if cycle_duration < TimeDelta::seconds(1) {
            return Err(DomainError::Validation(
                "ride cycle duration must be at least one second".into(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description: description.into(),
            capacity,
            cycle_duration,
        })
    }
}

/// A customer inside the park.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Customer identifier.
    pub id: Uuid,
    /// When the customer entered.
    pub entered_at: DateTime<Utc>,
    /// When the customer left, if they have.
    pub exited_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// Creates a customer entering at `at`.
    #[must_use]
    pub fn entering(at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            entered_at: at,
            exited_at: None,
        }
    }

    /// Returns `true` while the customer has not exited.
    #[must_use]
    pub fn is_inside(&self) -> bool {
        self.exited_at.is_none()
    }
}

/// Read/write access to ride reference data.
#[async_trait]
pub trait RideCatalog: Send + Sync {
    /// Looks up a ride.
    ///
    /// Returns `DomainError::NotFound` if it does not exist.
    async fn get_ride(&self, id: Uuid) -> Result<Ride, DomainError>;

    /// Lists every ride, ordered by name.
    async fn list_rides(&self) -> Result<Vec<Ride>, DomainError>;

    /// Registers a new ride.
    async fn add_ride(&self, ride: &Ride) -> Result<(), DomainError>;
}

/// Read/write access to customer reference data.
#[async_trait]
pub trait CustomerCatalog: Send + Sync {
    /// Looks up a customer, whether or not they are still inside.
    ///
    /// Returns `DomainError::NotFound` if it does not exist.
    async fn get_customer(&self, id: Uuid) -> Result<Customer, DomainError>;

    /// Lists customers that have not exited, ordered by entry time.
    async fn list_customers(&self) -> Result<Vec<Customer>, DomainError>;

    /// Registers a customer entering the park.
    async fn add_customer(&self, customer: &Customer) -> Result<(), DomainError>;

    /// Marks a customer as exited at `at` and returns the updated record.
    ///
    /// Returns `DomainError::NotFound` if it does not exist.
    async fn record_exit(&self, id: Uuid, at: DateTime<Utc>) -> Result<Customer, DomainError>;
}
