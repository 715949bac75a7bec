//! Aggregate roots for the Ride Queue context.
//!
//! Wait time only moves at batch boundaries. Each ride serves `capacity`
//! customers per cycle; the estimate grows by one cycle when a join completes
//! a fresh batch and shrinks by one cycle when a leave vacates a seat in a
//! batch that was full. It never lies in the past.
//!
//! A customer holds at most one seat. An unqueue only releases a seat whose
//! join is still counted, so a leave that follows a lapsed join changes
//! nothing.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use ridequeue_core::aggregate::Aggregate;
use ridequeue_core::catalog::Ride;
use serde::Serialize;
use uuid::Uuid;

use super::events::RideEvent;

/// Derived queue state of one ride.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RideQueueState {
    /// The ride identifier.
    pub ride_id: Uuid,
    /// Number of customers currently waiting.
    pub queue_count: u32,
    /// When a customer joining now would be served.
    pub estimated_service_time: DateTime<Utc>,
    /// When this state was derived.
    pub updated_at: DateTime<Utc>,
    /// Counted customers and the `valid_until` of their join.
    #[serde(skip)]
    waiting: BTreeMap<Uuid, DateTime<Utc>>,
}

impl RideQueueState {
    /// Remaining wait for a customer joining at `now`, never negative.
    #[must_use]
    pub fn wait_time(&self, now: DateTime<Utc>) -> TimeDelta {
        (self.estimated_service_time - now).max(TimeDelta::zero())
    }

    /// Whether `customer_id` holds a counted seat.
    #[must_use]
    pub fn is_waiting(&self, customer_id: Uuid) -> bool {
        self.waiting.contains_key(&customer_id)
    }

    /// The estimated service time a join at `now` would produce.
    #[must_use]
    pub fn service_time_after_join(&self, ride: &Ride, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut next = self.clone();
        next.join(ride, now);
        next.estimated_service_time
    }

    fn join(&mut self, ride: &Ride, now: DateTime<Utc>) {
        self.queue_count = self.queue_count.saturating_add(1);
        self.reestimate(ride, false, now);
    }

    fn leave(&mut self, ride: &Ride, now: DateTime<Utc>) {
        self.queue_count = self.queue_count.saturating_sub(1);
        self.reestimate(ride, true, now);
    }

    fn reestimate(&mut self, ride: &Ride, reduced: bool, now: DateTime<Utc>) {
        let capacity = ride.capacity.get();
        let batches = self.queue_count / capacity;
        let remainder = self.queue_count % capacity;

        if !reduced && remainder == 0 && batches >= 1 {
            self.estimated_service_time += ride.cycle_duration;
        }
        if reduced && remainder == capacity - 1 {
            self.estimated_service_time -= ride.cycle_duration;
        }
        if self.estimated_service_time < now {
            self.estimated_service_time = now;
        }
        self.updated_at = now;
    }
}

impl Aggregate for RideQueueState {
    type Event = RideEvent;
    type Reference = Ride;

    fn empty(id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            ride_id: id,
            queue_count: 0,
            estimated_service_time: now,
            updated_at: now,
            waiting: BTreeMap::new(),
        }
    }

    fn apply(&mut self, event: &RideEvent, ride: &Ride, now: DateTime<Utc>) {
        match event {
            RideEvent::CustomerQueued(joined) => {
                // Lapsed joins are history, not present state.
                if joined.to < now {
                    return;
                }
                if self.waiting.insert(joined.customer_id, joined.to).is_none() {
                    self.join(ride, now);
                }
            }
            RideEvent::CustomerUnqueued(left) => {
                if self.waiting.remove(&left.customer_id).is_some() {
                    self.leave(ride, now);
                }
            }
        }
    }

    fn observe(&mut self, now: DateTime<Utc>) {
        if self.estimated_service_time < now {
            self.estimated_service_time = now;
        }
    }

    fn cache_ttl(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.waiting.values().min().map(|expiry| *expiry - now)
    }
}
