//! Shared application state.

use std::fmt;
use std::sync::Arc;

use ridequeue_core::cache::StateCache;
use ridequeue_core::catalog::{CustomerCatalog, RideCatalog};
use ridequeue_core::clock::SharedClock;
use ridequeue_core::repository::EventLog;
use ridequeue_event_store::memory::{InMemoryCatalog, InMemoryEventLog};
use ridequeue_event_store::pg_catalog::PgCatalog;
use ridequeue_event_store::pg_event_log::PgEventLog;
use sqlx::PgPool;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for timestamps, wait times and expiry.
    pub clock: SharedClock,
    /// Event log for both aggregates.
    pub event_log: Arc<dyn EventLog>,
    /// Ride reference data.
    pub rides: Arc<dyn RideCatalog>,
    /// Customer reference data.
    pub customers: Arc<dyn CustomerCatalog>,
    /// Derived state cache, shared by both aggregates.
    pub cache: Arc<StateCache>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: SharedClock,
        event_log: Arc<dyn EventLog>,
        rides: Arc<dyn RideCatalog>,
        customers: Arc<dyn CustomerCatalog>,
        cache: Arc<StateCache>,
    ) -> Self {
        Self {
            clock,
            event_log,
            rides,
            customers,
            cache,
        }
    }

    /// State backed by PostgreSQL.
    #[must_use]
    pub fn postgres(pool: PgPool, clock: SharedClock, cache: Arc<StateCache>) -> Self {
        let catalog = Arc::new(PgCatalog::new(pool.clone()));
        Self::new(
            clock,
            Arc::new(PgEventLog::new(pool)),
            catalog.clone(),
            catalog,
            cache,
        )
    }

    /// State held entirely in process memory.
    #[must_use]
    pub fn in_memory(clock: SharedClock, cache: Arc<StateCache>) -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        Self::new(
            clock,
            Arc::new(InMemoryEventLog::new()),
            catalog.clone(),
            catalog,
            cache,
        )
    }
}
