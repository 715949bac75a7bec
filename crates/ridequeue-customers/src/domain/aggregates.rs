//! Aggregate roots for the Customer Queue context.

use chrono::{DateTime, TimeDelta, Utc};
use ridequeue_core::aggregate::Aggregate;
use serde::Serialize;
use uuid::Uuid;

use super::events::CustomerEvent;

/// Derived queue state of one customer.
///
/// The latest event wins. A queued window that has already ended is treated
/// as over when the state is observed, without any event recording it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerQueueState {
    /// The customer identifier.
    pub customer_id: Uuid,
    /// Whether the customer currently holds a queue slot.
    pub is_queueing: bool,
    /// The ride queued for; `None` unless queueing.
    pub ride_id: Option<Uuid>,
    /// Start of the occupied window.
    pub window_start: Option<DateTime<Utc>>,
    /// End of the occupied window.
    pub window_end: Option<DateTime<Utc>>,
    /// When this state was derived.
    pub updated_at: DateTime<Utc>,
}

impl CustomerQueueState {
    /// Returns `true` if the customer holds a window that has not ended at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.is_queueing && self.window_end.is_some_and(|end| end >= now)
    }

    fn clear(&mut self) {
        self.is_queueing = false;
        self.ride_id = None;
        self.window_start = None;
        self.window_end = None;
    }
}

impl Aggregate for CustomerQueueState {
    type Event = CustomerEvent;
    type Reference = ();

    fn empty(id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            customer_id: id,
            is_queueing: false,
            ride_id: None,
            window_start: None,
            window_end: None,
            updated_at: now,
        }
    }

    fn apply(&mut self, event: &CustomerEvent, _reference: &(), now: DateTime<Utc>) {
        match event {
            CustomerEvent::Queued(queued) => {
                self.is_queueing = true;
                self.ride_id = Some(queued.ride_id);
                self.window_start = Some(queued.from);
                self.window_end = Some(queued.to);
            }
            CustomerEvent::Unqueued(_) => self.clear(),
        }
        self.updated_at = now;
    }

    fn observe(&mut self, now: DateTime<Utc>) {
        if self.is_queueing && !self.is_active(now) {
            self.clear();
            self.updated_at = now;
        }
    }

    fn cache_ttl(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        if !self.is_queueing {
            return None;
        }
        self.window_end.map(|end| end - now)
    }
}
