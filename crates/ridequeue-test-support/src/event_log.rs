//! Test event logs: failure injection and call counting around the
//! in-memory log.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ridequeue_core::error::DomainError;
use ridequeue_core::event::{AggregateKind, EventRecord};
use ridequeue_core::repository::EventLog;
use ridequeue_event_store::memory::InMemoryEventLog;
use uuid::Uuid;

fn injected(what: &str) -> DomainError {
    DomainError::Infrastructure(format!("injected {what} failure"))
}

/// An event log that fails every call with an infrastructure error.
#[derive(Debug)]
pub struct FailingEventLog;

#[async_trait]
impl EventLog for FailingEventLog {
    async fn append(&self, _record: &EventRecord) -> Result<(), DomainError> {
        Err(injected("append"))
    }

    async fn events_for(
        &self,
        _source_id: Uuid,
        _aggregate_root: AggregateKind,
    ) -> Result<Vec<EventRecord>, DomainError> {
        Err(injected("query"))
    }
}

/// Reads normally but rejects appends for one aggregate kind.
///
/// Lets a test make the customer-side append fail after the ride-side one
/// succeeded.
#[derive(Debug)]
pub struct FailingAppendsFor {
    inner: InMemoryEventLog,
    kind: AggregateKind,
}

impl FailingAppendsFor {
    /// Creates an empty log that rejects appends of `kind`.
    #[must_use]
    pub fn new(kind: AggregateKind) -> Self {
        Self {
            inner: InMemoryEventLog::new(),
            kind,
        }
    }

    /// The records that were accepted.
    #[must_use]
    pub fn inner(&self) -> &InMemoryEventLog {
        &self.inner
    }
}

#[async_trait]
impl EventLog for FailingAppendsFor {
    async fn append(&self, record: &EventRecord) -> Result<(), DomainError> {
        if record.aggregate_root == self.kind {
            return Err(injected("append"));
        }
        self.inner.append(record).await
    }

    async fn events_for(
        &self,
        source_id: Uuid,
        aggregate_root: AggregateKind,
    ) -> Result<Vec<EventRecord>, DomainError> {
        self.inner.events_for(source_id, aggregate_root).await
    }
}

/// Accepts the first `n` appends, then rejects every later one.
#[derive(Debug)]
pub struct FailAfterAppends {
    inner: InMemoryEventLog,
    remaining: AtomicUsize,
}

impl FailAfterAppends {
    /// Creates an empty log that accepts `n` appends.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            inner: InMemoryEventLog::new(),
            remaining: AtomicUsize::new(n),
        }
    }

    /// The records that were accepted.
    #[must_use]
    pub fn inner(&self) -> &InMemoryEventLog {
        &self.inner
    }
}

#[async_trait]
impl EventLog for FailAfterAppends {
    async fn append(&self, record: &EventRecord) -> Result<(), DomainError> {
        let allowed = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(injected("append"));
        }
        self.inner.append(record).await
    }

    async fn events_for(
        &self,
        source_id: Uuid,
        aggregate_root: AggregateKind,
    ) -> Result<Vec<EventRecord>, DomainError> {
        self.inner.events_for(source_id, aggregate_root).await
    }
}

/// An in-memory log that counts how often it is queried and appended to.
#[derive(Debug, Default)]
pub struct CountingEventLog {
    inner: InMemoryEventLog,
    queries: AtomicUsize,
    appends: AtomicUsize,
}

impl CountingEventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `events_for` calls so far.
    #[must_use]
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Number of successful `append` calls so far.
    #[must_use]
    pub fn appends(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    /// The records that were appended.
    #[must_use]
    pub fn inner(&self) -> &InMemoryEventLog {
        &self.inner
    }
}

#[async_trait]
impl EventLog for CountingEventLog {
    async fn append(&self, record: &EventRecord) -> Result<(), DomainError> {
        self.inner.append(record).await?;
        self.appends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn events_for(
        &self,
        source_id: Uuid,
        aggregate_root: AggregateKind,
    ) -> Result<Vec<EventRecord>, DomainError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.events_for(source_id, aggregate_root).await
    }
}
