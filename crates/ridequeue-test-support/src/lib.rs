//! Shared test clocks, event logs and fixtures for ridequeue.

mod clock;
mod event_log;
mod fixtures;

pub use clock::{FixedClock, ManualClock};
pub use event_log::{CountingEventLog, FailAfterAppends, FailingAppendsFor, FailingEventLog};
pub use fixtures::{fixed_now, test_cache, test_customer, test_ride};
pub use ridequeue_event_store::memory::{InMemoryCatalog, InMemoryEventLog};
