//! Common fixtures.

use std::num::NonZeroUsize;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use ridequeue_core::cache::StateCache;
use ridequeue_core::catalog::{Customer, Ride};
use ridequeue_core::clock::SharedClock;

/// The instant most tests treat as "now": 2026-01-15 10:00:00 UTC.
///
/// # Panics
///
/// Never in practice; the date is a valid constant.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// A state cache large enough that tests never see eviction.
#[must_use]
pub fn test_cache(clock: SharedClock) -> StateCache {
    StateCache::new(NonZeroUsize::new(1024).unwrap(), clock)
}

/// A ride named "Coaster" with the given throughput.
///
/// # Panics
///
/// Panics if `capacity` is zero or `cycle` is shorter than one second.
#[must_use]
pub fn test_ride(capacity: u32, cycle: TimeDelta) -> Ride {
    Ride::new("Coaster", "test ride", capacity, cycle).unwrap()
}

/// A customer who entered the park at [`fixed_now`].
#[must_use]
pub fn test_customer() -> Customer {
    Customer::entering(fixed_now())
}
