//! In-memory event log and catalog.
//!
//! Same contracts as the PostgreSQL implementations, held in process. Used
//! when no database is configured and as the backing store in tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use ridequeue_core::catalog::{Customer, CustomerCatalog, Ride, RideCatalog};
use ridequeue_core::error::DomainError;
use ridequeue_core::event::{AggregateKind, EventRecord};
use ridequeue_core::repository::EventLog;

fn lock_poisoned() -> DomainError {
    DomainError::Infrastructure("lock poisoned".into())
}

/// An event log kept in a vector, in append order.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    records: RwLock<Vec<EventRecord>>,
}

impl InMemoryEventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every record, in append order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the lock is poisoned.
    pub fn all_records(&self) -> Result<Vec<EventRecord>, DomainError> {
        Ok(self.records.read().map_err(|_| lock_poisoned())?.clone())
    }

    /// Returns the number of appended records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().map_or(0, |records| records.len())
    }

    /// Returns `true` if nothing was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, record: &EventRecord) -> Result<(), DomainError> {
        self.records
            .write()
            .map_err(|_| lock_poisoned())?
            .push(record.clone());
        Ok(())
    }

    async fn events_for(
        &self,
        source_id: Uuid,
        aggregate_root: AggregateKind,
    ) -> Result<Vec<EventRecord>, DomainError> {
        let records = self.records.read().map_err(|_| lock_poisoned())?;
        let mut matching: Vec<EventRecord> = records
            .iter()
            .filter(|r| r.source_id == source_id && r.aggregate_root == aggregate_root)
            .cloned()
            .collect();
        // Stable sort keeps append order for equal timestamps.
        matching.sort_by_key(|r| r.occurred_at);
        Ok(matching)
    }
}

/// Ride and customer reference data kept in hash maps.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    rides: RwLock<HashMap<Uuid, Ride>>,
    customers: RwLock<HashMap<Uuid, Customer>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog pre-populated with `rides` and `customers`.
    #[must_use]
    pub fn with(rides: Vec<Ride>, customers: Vec<Customer>) -> Self {
        Self {
            rides: RwLock::new(rides.into_iter().map(|r| (r.id, r)).collect()),
            customers: RwLock::new(customers.into_iter().map(|c| (c.id, c)).collect()),
        }
    }
}

#[async_trait]
impl RideCatalog for InMemoryCatalog {
    async fn get_ride(&self, id: Uuid) -> Result<Ride, DomainError> {
        self.rides
            .read()
            .map_err(|_| lock_poisoned())?
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::ride_not_found(id))
    }

    async fn list_rides(&self) -> Result<Vec<Ride>, DomainError> {
        let mut rides: Vec<Ride> = self
            .rides
            .read()
            .map_err(|_| lock_poisoned())?
            .values()
            .cloned()
            .collect();
        rides.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rides)
    }

    async fn add_ride(&self, ride: &Ride) -> Result<(), DomainError> {
        let mut rides = self.rides.write().map_err(|_| lock_poisoned())?;
        if rides.contains_key(&ride.id) {
            return Err(DomainError::Validation(format!(
                "ride {} already exists",
                ride.id
            )));
        }
        rides.insert(ride.id, ride.clone());
        Ok(())
    }
}

#[async_trait]
impl CustomerCatalog for InMemoryCatalog {
    async fn get_customer(&self, id: Uuid) -> Result<Customer, DomainError> {
        self.customers
            .read()
            .map_err(|_| lock_poisoned())?
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::customer_not_found(id))
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, DomainError> {
        let mut inside: Vec<Customer> = self
            .customers
            .read()
            .map_err(|_| lock_poisoned())?
            .values()
            .filter(|c| c.is_inside())
            .cloned()
            .collect();
        inside.sort_by(|a, b| a.entered_at.cmp(&b.entered_at).then(a.id.cmp(&b.id)));
        Ok(inside)
    }

    async fn add_customer(&self, customer: &Customer) -> Result<(), DomainError> {
        self.customers
            .write()
            .map_err(|_| lock_poisoned())?
            .insert(customer.id, customer.clone());
        Ok(())
    }

    async fn record_exit(&self, id: Uuid, at: DateTime<Utc>) -> Result<Customer, DomainError> {
        let mut customers = self.customers.write().map_err(|_| lock_poisoned())?;
        let customer = customers
            .get_mut(&id)
            .ok_or_else(|| DomainError::customer_not_found(id))?;
        customer.exited_at = Some(at);
        Ok(customer.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn record(source_id: Uuid, kind: AggregateKind, occurred_at: DateTime<Utc>, name: &str) -> EventRecord {
        EventRecord {
            event_id: Uuid::new_v4(),
            source_id,
            aggregate_root: kind,
            name: name.to_owned(),
            occurred_at,
            valid_until: None,
            correlation_id: Uuid::new_v4(),
            payload: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_events_for_returns_empty_vec_for_unknown_stream() {
        let log = InMemoryEventLog::new();

        let events = log
            .events_for(Uuid::new_v4(), AggregateKind::Ride)
            .await
            .unwrap();

        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_events_for_never_leaks_across_aggregate_kinds() {
        // Arrange
        let log = InMemoryEventLog::new();
        let id = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        log.append(&record(id, AggregateKind::Ride, now, "ride")).await.unwrap();
        log.append(&record(id, AggregateKind::Customer, now, "customer"))
            .await
            .unwrap();
        log.append(&record(Uuid::new_v4(), AggregateKind::Ride, now, "other"))
            .await
            .unwrap();

        // Act
        let rides = log.events_for(id, AggregateKind::Ride).await.unwrap();

        // Assert
        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].name, "ride");
    }

    #[tokio::test]
    async fn test_events_for_orders_by_occurred_at_then_append_order() {
        // Arrange
        let log = InMemoryEventLog::new();
        let id = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        log.append(&record(id, AggregateKind::Ride, now, "second")).await.unwrap();
        log.append(&record(id, AggregateKind::Ride, now, "third")).await.unwrap();
        log.append(&record(id, AggregateKind::Ride, now - TimeDelta::minutes(1), "first"))
            .await
            .unwrap();

        // Act
        let events = log.events_for(id, AggregateKind::Ride).await.unwrap();

        // Assert
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_get_ride_returns_not_found_for_unknown_id() {
        let catalog = InMemoryCatalog::new();
        let id = Uuid::new_v4();

        let result = catalog.get_ride(id).await;

        assert!(matches!(result, Err(DomainError::NotFound { id: missing, .. }) if missing == id));
    }

    #[tokio::test]
    async fn test_list_customers_excludes_exited_customers() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let staying = Customer::entering(now);
        let leaving = Customer::entering(now);
        let catalog = InMemoryCatalog::with(vec![], vec![staying.clone(), leaving.clone()]);

        // Act
        let exited = catalog.record_exit(leaving.id, now).await.unwrap();
        let inside = catalog.list_customers().await.unwrap();

        // Assert
        assert_eq!(exited.exited_at, Some(now));
        assert_eq!(inside, vec![staying]);
    }
}
