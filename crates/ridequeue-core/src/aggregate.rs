//! Aggregate replay contract and read-through state loading.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::cache::{CacheKey, StateCache};
use crate::clock::Clock;
use crate::error::DomainError;
use crate::event::{DomainEvent, EventRecord};
use crate::repository::EventLog;

/// Derived state of one entity, computed from its own event stream.
///
/// State is a pure function of the ordered events, the read-only reference
/// data and the observation time: replaying the same events at the same
/// `now` always yields the same value.
pub trait Aggregate: Clone + Send + Sync + Sized + 'static {
    /// The closed event type this aggregate consumes.
    type Event: DomainEvent;

    /// Read-only reference data the transitions need.
    type Reference: ?Sized + Sync;

    /// The state before any event was applied.
    fn empty(id: Uuid, now: DateTime<Utc>) -> Self;

    /// Applies one event. Used by both the live mutation path and replay.
    fn apply(&mut self, event: &Self::Event, reference: &Self::Reference, now: DateTime<Utc>);

    /// Brings time-dependent fields up to date for an observation at `now`.
    ///
    /// Called after replay and on every cache hit.
    fn observe(&mut self, _now: DateTime<Utc>) {}

    /// How long this state may be cached; `None` keeps it until invalidated.
    fn cache_ttl(&self, _now: DateTime<Utc>) -> Option<TimeDelta> {
        None
    }

    /// Folds `records` in order, starting from the empty state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a record cannot be decoded.
    fn replay(
        id: Uuid,
        records: &[EventRecord],
        reference: &Self::Reference,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut state = Self::empty(id, now);
        for record in records {
            let event = Self::Event::from_record(record)?;
            state.apply(&event, reference, now);
        }
        state.observe(now);
        Ok(state)
    }
}

/// Returns the current state of aggregate `id`.
///
/// A cache hit is returned without touching the log. On a miss the full event
/// history is replayed and the result is cached with the aggregate's TTL.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the log query or decoding fails.
pub async fn load_current_state<A: Aggregate>(
    id: Uuid,
    reference: &A::Reference,
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
) -> Result<A, DomainError> {
    let key = CacheKey::new(A::Event::AGGREGATE, id);
    let now = clock.now();

    if let Some(mut state) = cache.get::<A>(&key) {
        debug!(%key, "state cache hit");
        state.observe(now);
        return Ok(state);
    }

    debug!(%key, "state cache miss; replaying event log");
    let records = event_log.events_for(id, A::Event::AGGREGATE).await?;
    let state = A::replay(id, &records, reference, now)?;
    cache.set(key, state.clone(), state.cache_ttl(now));
    debug!(%key, events = records.len(), "replayed aggregate state");
    Ok(state)
}
