//! Command handlers for queueing orchestration.
//!
//! Join: check the customer is free, add them to the ride queue, then open
//! the customer's window over exactly the span the ride-side join record
//! counts them (its `occurred_at` to its `valid_until`), so both aggregates
//! let the join lapse at the same instant. If anything after the ride-side
//! append fails, the ride-side join is undone before the error is returned.
//!
//! Leave: remove the customer from the ride queue, then close their window.
//! A failure between the two appends is logged and not compensated.

use ridequeue_core::cache::StateCache;
use ridequeue_core::catalog::{CustomerCatalog, RideCatalog};
use ridequeue_core::clock::Clock;
use ridequeue_core::command::Command;
use ridequeue_core::error::DomainError;
use ridequeue_core::repository::EventLog;
use ridequeue_customers::application::command_handlers as customer_commands;
use ridequeue_customers::application::query_handlers::get_customer_queue_state;
use ridequeue_customers::domain::aggregates::CustomerQueueState;
use ridequeue_customers::domain::commands::{QueueWindow, RecordCustomerJoin, RecordCustomerLeave};
use ridequeue_rides::application::command_handlers as ride_commands;
use ridequeue_rides::application::query_handlers::get_ride_queue_state;
use ridequeue_rides::domain::aggregates::RideQueueState;
use ridequeue_rides::domain::commands::{RecordRideJoin, RecordRideLeave};
use tracing::{error, info, instrument};

use super::compensation::{Compensation, CompensationLog};
use crate::domain::commands::{JoinQueue, LeaveQueue};

/// States of both aggregates after a successful join or leave.
#[derive(Debug, Clone)]
pub struct QueueingOutcome {
    /// The ride's queue state.
    pub ride: RideQueueState,
    /// The customer's queue state.
    pub customer: CustomerQueueState,
}

/// Logs a failed orchestration step. Precondition violations are expected
/// outcomes and stay at `info`; anything else is an `error`.
fn log_step_failure(failure: &DomainError, message: &str) {
    if failure.is_precondition() {
        info!(error = %failure, "{message}");
    } else {
        error!(error = %failure, "{message}");
    }
}

/// Handles the `JoinQueue` command.
///
/// # Errors
///
/// - `DomainError::NotFound` if the ride or customer does not exist.
/// - `DomainError::AlreadyQueued` if the customer holds an unexpired window;
///   nothing is appended.
/// - `DomainError::Infrastructure` if an append or read fails. The ride-side
///   join has been undone by then, unless undoing it failed as well.
#[instrument(
    skip_all,
    fields(
        customer_id = %command.customer_id,
        ride_id = %command.ride_id,
        correlation_id = %command.correlation_id,
    )
)]
pub async fn handle_join_queue(
    command: &JoinQueue,
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
    rides: &dyn RideCatalog,
    customers: &dyn CustomerCatalog,
) -> Result<QueueingOutcome, DomainError> {
    let ride = rides.get_ride(command.ride_id).await?;
    customers.get_customer(command.customer_id).await?;

    let current = get_customer_queue_state(command.customer_id, clock, event_log, cache).await?;
    if current.is_queueing {
        return Err(DomainError::AlreadyQueued(command.customer_id));
    }

    let mut compensation = CompensationLog::new(command.correlation_id);
    let ride_join = RecordRideJoin {
        correlation_id: command.correlation_id,
        ride_id: ride.id,
        customer_id: command.customer_id,
    };
    let joined_ride =
        ride_commands::handle_record_join(&ride_join, &ride, clock, event_log, cache).await?;
    compensation.record(Compensation::UndoRideJoin {
        ride: ride.clone(),
        customer_id: command.customer_id,
    });

    let customer_side = async {
        let ride_state = get_ride_queue_state(&ride, clock, event_log, cache).await?;
        let window_end = joined_ride.record.valid_until.ok_or_else(|| {
            DomainError::Infrastructure("ride join was recorded without valid_until".to_owned())
        })?;
        let window = QueueWindow::new(joined_ride.record.occurred_at, window_end)?;
        let customer_join = RecordCustomerJoin {
            correlation_id: command.correlation_id,
            customer_id: command.customer_id,
            ride_id: ride.id,
            window,
        };
        let joined =
            customer_commands::handle_record_join(&customer_join, clock, event_log, cache).await?;
        Ok::<_, DomainError>(QueueingOutcome {
            ride: ride_state,
            customer: joined.state,
        })
    }
    .await;

    match customer_side {
        Ok(outcome) => {
            info!(
                command = command.command_type(),
                queue_count = outcome.ride.queue_count,
                "customer joined queue"
            );
            Ok(outcome)
        }
        Err(failure) => {
            log_step_failure(&failure, "customer-side join failed; undoing ride-side join");
            if let Err(undo_failure) = compensation.unwind(clock, event_log, cache).await {
                error!(
                    error = %failure,
                    compensation_error = %undo_failure,
                    "compensation failed; ride queue needs manual reconciliation"
                );
                return Err(DomainError::Infrastructure(format!(
                    "join failed ({failure}) and could not be undone ({undo_failure})"
                )));
            }
            Err(failure)
        }
    }
}

/// Handles the `LeaveQueue` command.
///
/// # Errors
///
/// - `DomainError::NotFound` if the customer or their ride does not exist.
/// - `DomainError::NotQueued` if the customer holds no active window.
/// - `DomainError::Infrastructure` if an append or read fails.
#[instrument(
    skip_all,
    fields(customer_id = %command.customer_id, correlation_id = %command.correlation_id)
)]
pub async fn handle_leave_queue(
    command: &LeaveQueue,
    clock: &dyn Clock,
    event_log: &dyn EventLog,
    cache: &StateCache,
    rides: &dyn RideCatalog,
    customers: &dyn CustomerCatalog,
) -> Result<QueueingOutcome, DomainError> {
    customers.get_customer(command.customer_id).await?;

    let current = get_customer_queue_state(command.customer_id, clock, event_log, cache).await?;
    let Some(ride_id) = current.ride_id.filter(|_| current.is_queueing) else {
        return Err(DomainError::NotQueued(command.customer_id));
    };
    let ride = rides.get_ride(ride_id).await?;

    let ride_leave = RecordRideLeave {
        correlation_id: command.correlation_id,
        ride_id,
        customer_id: command.customer_id,
    };
    let left_ride =
        ride_commands::handle_record_leave(&ride_leave, &ride, clock, event_log, cache).await?;

    let customer_leave = RecordCustomerLeave {
        correlation_id: command.correlation_id,
        customer_id: command.customer_id,
    };
    let left_queue =
        match customer_commands::handle_record_leave(&customer_leave, clock, event_log, cache)
            .await
        {
            Ok(result) => result,
            Err(failure) => {
                log_step_failure(
                    &failure,
                    "ride-side leave recorded but customer-side leave failed",
                );
                return Err(failure);
            }
        };

    info!(
        command = command.command_type(),
        %ride_id,
        queue_count = left_ride.state.queue_count,
        "customer left queue"
    );

    Ok(QueueingOutcome {
        ride: left_ride.state,
        customer: left_queue.state,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeDelta;
    use ridequeue_core::catalog::{Customer, Ride};
    use ridequeue_core::clock::SharedClock;
    use ridequeue_core::error::{DomainError, Entity};
    use ridequeue_core::event::AggregateKind;
    use ridequeue_core::repository::EventLog;
    use ridequeue_customers::application::query_handlers::get_customer_queue_state;
    use ridequeue_rides::application::query_handlers::get_ride_queue_state;
    use ridequeue_test_support::{
        FailAfterAppends, FailingAppendsFor, FixedClock, InMemoryCatalog, InMemoryEventLog,
        ManualClock, fixed_now, test_cache, test_customer, test_ride,
    };
    use std::sync::Mutex;

    use tracing::Level;
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use uuid::Uuid;

    use super::{handle_join_queue, handle_leave_queue, log_step_failure};
    use crate::domain::commands::{JoinQueue, LeaveQueue};

    struct Fixture {
        ride: Ride,
        customer: Customer,
        catalog: InMemoryCatalog,
    }

    fn fixture(capacity: u32, cycle: TimeDelta) -> Fixture {
        let ride = test_ride(capacity, cycle);
        let customer = test_customer();
        let catalog = InMemoryCatalog::with(vec![ride.clone()], vec![customer.clone()]);
        Fixture {
            ride,
            customer,
            catalog,
        }
    }

    fn join(f: &Fixture) -> JoinQueue {
        JoinQueue {
            correlation_id: Uuid::new_v4(),
            customer_id: f.customer.id,
            ride_id: f.ride.id,
        }
    }

    fn leave(f: &Fixture) -> LeaveQueue {
        leave_as(&f.customer)
    }

    fn join_as(ride: &Ride, customer: &Customer) -> JoinQueue {
        JoinQueue {
            correlation_id: Uuid::new_v4(),
            customer_id: customer.id,
            ride_id: ride.id,
        }
    }

    fn leave_as(customer: &Customer) -> LeaveQueue {
        LeaveQueue {
            correlation_id: Uuid::new_v4(),
            customer_id: customer.id,
        }
    }

    #[derive(Clone, Default)]
    struct LevelRecorder(Arc<Mutex<Vec<Level>>>);

    impl<S: tracing::Subscriber> Layer<S> for LevelRecorder {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    fn levels_logged_for(failure: &DomainError) -> Vec<Level> {
        let recorder = LevelRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        tracing::subscriber::with_default(subscriber, || {
            log_step_failure(failure, "step failed");
        });
        recorder.0.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_join_queue_updates_both_aggregates() {
        // Arrange
        let now = fixed_now();
        let cycle = TimeDelta::minutes(10);
        let f = fixture(1, cycle);
        let clock: SharedClock = Arc::new(FixedClock(now));
        let cache = test_cache(clock.clone());
        let log = InMemoryEventLog::new();
        let command = join(&f);

        // Act
        let outcome = handle_join_queue(
            &command,
            clock.as_ref(),
            &log,
            &cache,
            &f.catalog,
            &f.catalog,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(outcome.ride.queue_count, 1);
        assert_eq!(outcome.ride.estimated_service_time, now + cycle);
        assert!(outcome.customer.is_queueing);
        assert_eq!(outcome.customer.ride_id, Some(f.ride.id));
        assert_eq!(outcome.customer.window_start, Some(now));
        assert_eq!(outcome.customer.window_end, Some(now + cycle * 2));

        let records = log.all_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].aggregate_root, AggregateKind::Ride);
        assert_eq!(records[1].aggregate_root, AggregateKind::Customer);
        assert!(records.iter().all(|r| r.correlation_id == command.correlation_id));
        assert_eq!(records[0].valid_until, records[1].valid_until);
    }

    #[tokio::test]
    async fn test_join_queue_rejects_already_queued_customer_without_appending() {
        // Arrange
        let f = fixture(4, TimeDelta::minutes(10));
        let clock: SharedClock = Arc::new(FixedClock(fixed_now()));
        let cache = test_cache(clock.clone());
        let log = InMemoryEventLog::new();
        handle_join_queue(&join(&f), clock.as_ref(), &log, &cache, &f.catalog, &f.catalog)
            .await
            .unwrap();

        // Act
        let result =
            handle_join_queue(&join(&f), clock.as_ref(), &log, &cache, &f.catalog, &f.catalog)
                .await;

        // Assert
        assert!(matches!(result, Err(DomainError::AlreadyQueued(id)) if id == f.customer.id));
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_join_queue_allows_rejoin_once_window_elapsed() {
        // Arrange
        let start = fixed_now();
        let cycle = TimeDelta::minutes(10);
        let f = fixture(4, cycle);
        let manual = Arc::new(ManualClock::new(start));
        let clock: SharedClock = manual.clone();
        let cache = test_cache(clock.clone());
        let log = InMemoryEventLog::new();
        handle_join_queue(&join(&f), clock.as_ref(), &log, &cache, &f.catalog, &f.catalog)
            .await
            .unwrap();
        manual.advance(cycle + TimeDelta::seconds(1));

        // Act
        let outcome =
            handle_join_queue(&join(&f), clock.as_ref(), &log, &cache, &f.catalog, &f.catalog)
                .await
                .unwrap();

        // Assert
        assert!(outcome.customer.is_queueing);
        assert_eq!(outcome.ride.queue_count, 1);
        assert_eq!(log.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_customer_append_leaves_ride_queue_count_unchanged() {
        // Arrange
        let f = fixture(2, TimeDelta::minutes(10));
        let clock: SharedClock = Arc::new(FixedClock(fixed_now()));
        let cache = test_cache(clock.clone());
        let log = FailingAppendsFor::new(AggregateKind::Customer);
        let before = get_ride_queue_state(&f.ride, clock.as_ref(), &log, &cache)
            .await
            .unwrap();

        // Act
        let result =
            handle_join_queue(&join(&f), clock.as_ref(), &log, &cache, &f.catalog, &f.catalog)
                .await;
        let after = get_ride_queue_state(&f.ride, clock.as_ref(), &log, &cache)
            .await
            .unwrap();
        let customer = get_customer_queue_state(f.customer.id, clock.as_ref(), &log, &cache)
            .await
            .unwrap();

        // Assert
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
        assert_eq!(after.queue_count, before.queue_count);
        assert_eq!(after.estimated_service_time, before.estimated_service_time);
        assert!(!customer.is_queueing);
        let names: Vec<String> = log
            .inner()
            .all_records()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["RideCustomerQueued", "RideCustomerUnQueued"]);
    }

    #[tokio::test]
    async fn test_failed_compensation_surfaces_as_infrastructure_error() {
        // Arrange
        let f = fixture(2, TimeDelta::minutes(10));
        let clock: SharedClock = Arc::new(FixedClock(fixed_now()));
        let cache = test_cache(clock.clone());
        let log = FailAfterAppends::new(1);

        // Act
        let result =
            handle_join_queue(&join(&f), clock.as_ref(), &log, &cache, &f.catalog, &f.catalog)
                .await;

        // Assert
        match result {
            Err(DomainError::Infrastructure(message)) => {
                assert!(message.contains("could not be undone"));
            }
            other => panic!("expected Infrastructure, got {other:?}"),
        }
        assert_eq!(log.inner().len(), 1);
    }

    #[tokio::test]
    async fn test_join_queue_returns_not_found_for_unknown_ride_or_customer() {
        // Arrange
        let f = fixture(2, TimeDelta::minutes(10));
        let clock: SharedClock = Arc::new(FixedClock(fixed_now()));
        let cache = test_cache(clock.clone());
        let log = InMemoryEventLog::new();
        let unknown_ride = JoinQueue {
            ride_id: Uuid::new_v4(),
            ..join(&f)
        };
        let unknown_customer = JoinQueue {
            customer_id: Uuid::new_v4(),
            ..join(&f)
        };

        // Act
        let ride_result = handle_join_queue(
            &unknown_ride,
            clock.as_ref(),
            &log,
            &cache,
            &f.catalog,
            &f.catalog,
        )
        .await;
        let customer_result = handle_join_queue(
            &unknown_customer,
            clock.as_ref(),
            &log,
            &cache,
            &f.catalog,
            &f.catalog,
        )
        .await;

        // Assert
        assert!(matches!(
            ride_result,
            Err(DomainError::NotFound { entity: Entity::Ride, .. })
        ));
        assert!(matches!(
            customer_result,
            Err(DomainError::NotFound { entity: Entity::Customer, .. })
        ));
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_leave_queue_reverses_join_on_both_aggregates() {
        // Arrange
        let now = fixed_now();
        let f = fixture(1, TimeDelta::minutes(10));
        let clock: SharedClock = Arc::new(FixedClock(now));
        let cache = test_cache(clock.clone());
        let log = InMemoryEventLog::new();
        handle_join_queue(&join(&f), clock.as_ref(), &log, &cache, &f.catalog, &f.catalog)
            .await
            .unwrap();

        // Act
        let outcome =
            handle_leave_queue(&leave(&f), clock.as_ref(), &log, &cache, &f.catalog, &f.catalog)
                .await
                .unwrap();

        // Assert
        assert_eq!(outcome.ride.queue_count, 0);
        assert_eq!(outcome.ride.estimated_service_time, now);
        assert!(!outcome.customer.is_queueing);
        assert_eq!(outcome.customer.ride_id, None);
        assert_eq!(log.len(), 4);
    }

    #[tokio::test]
    async fn test_leave_queue_rejects_customer_who_is_not_queueing() {
        // Arrange
        let f = fixture(1, TimeDelta::minutes(10));
        let clock: SharedClock = Arc::new(FixedClock(fixed_now()));
        let cache = test_cache(clock.clone());
        let log = InMemoryEventLog::new();

        // Act
        let result =
            handle_leave_queue(&leave(&f), clock.as_ref(), &log, &cache, &f.catalog, &f.catalog)
                .await;

        // Assert
        assert!(matches!(result, Err(DomainError::NotQueued(id)) if id == f.customer.id));
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_leave_queue_surfaces_customer_side_failure_after_ride_leave() {
        // Arrange
        let f = fixture(1, TimeDelta::minutes(10));
        let clock: SharedClock = Arc::new(FixedClock(fixed_now()));
        let cache = test_cache(clock.clone());
        let log = FailAfterAppends::new(3);
        handle_join_queue(&join(&f), clock.as_ref(), &log, &cache, &f.catalog, &f.catalog)
            .await
            .unwrap();

        // Act
        let result =
            handle_leave_queue(&leave(&f), clock.as_ref(), &log, &cache, &f.catalog, &f.catalog)
                .await;
        let ride = get_ride_queue_state(&f.ride, clock.as_ref(), &log, &cache)
            .await
            .unwrap();

        // Assert
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
        assert_eq!(ride.queue_count, 0);
        assert_eq!(log.inner().len(), 3);
        let customer_events = log
            .events_for(f.customer.id, AggregateKind::Customer)
            .await
            .unwrap();
        assert_eq!(customer_events.len(), 1);
    }

    #[tokio::test]
    async fn test_window_end_matches_ride_join_after_cached_read() {
        // Arrange
        let t0 = fixed_now();
        let cycle = TimeDelta::minutes(10);
        let ride = test_ride(1, cycle);
        let (first, second) = (test_customer(), test_customer());
        let catalog =
            InMemoryCatalog::with(vec![ride.clone()], vec![first.clone(), second.clone()]);
        let manual = Arc::new(ManualClock::new(t0));
        let clock: SharedClock = manual.clone();
        let cache = test_cache(clock.clone());
        let log = InMemoryEventLog::new();
        handle_join_queue(
            &join_as(&ride, &first),
            clock.as_ref(),
            &log,
            &cache,
            &catalog,
            &catalog,
        )
        .await
        .unwrap();
        get_ride_queue_state(&ride, clock.as_ref(), &log, &cache)
            .await
            .unwrap();
        manual.advance(TimeDelta::minutes(5));

        // Act
        let outcome = handle_join_queue(
            &join_as(&ride, &second),
            clock.as_ref(),
            &log,
            &cache,
            &catalog,
            &catalog,
        )
        .await
        .unwrap();

        // Assert
        let ride_records = log.events_for(ride.id, AggregateKind::Ride).await.unwrap();
        let second_join = ride_records.last().unwrap();
        assert_eq!(outcome.customer.window_start, Some(second_join.occurred_at));
        assert_eq!(outcome.customer.window_end, second_join.valid_until);
        assert_eq!(outcome.customer.window_end, Some(t0 + TimeDelta::minutes(30)));

        manual.set(t0 + TimeDelta::minutes(30) - TimeDelta::seconds(1));
        let left = handle_leave_queue(
            &leave_as(&second),
            clock.as_ref(),
            &log,
            &cache,
            &catalog,
            &catalog,
        )
        .await
        .unwrap();
        assert_eq!(left.ride.queue_count, 0);
        assert!(!left.customer.is_queueing);
    }

    #[tokio::test]
    async fn test_leave_succeeds_after_an_earlier_customer_left_and_lapsed() {
        // Arrange
        let t0 = fixed_now();
        let ride = test_ride(4, TimeDelta::minutes(10));
        let (first, second) = (test_customer(), test_customer());
        let catalog =
            InMemoryCatalog::with(vec![ride.clone()], vec![first.clone(), second.clone()]);
        let manual = Arc::new(ManualClock::new(t0));
        let clock: SharedClock = manual.clone();
        let cache = test_cache(clock.clone());
        let log = InMemoryEventLog::new();
        handle_join_queue(
            &join_as(&ride, &first),
            clock.as_ref(),
            &log,
            &cache,
            &catalog,
            &catalog,
        )
        .await
        .unwrap();
        manual.advance(TimeDelta::minutes(1));
        let joined = handle_join_queue(
            &join_as(&ride, &second),
            clock.as_ref(),
            &log,
            &cache,
            &catalog,
            &catalog,
        )
        .await
        .unwrap();
        manual.advance(TimeDelta::minutes(1));
        handle_leave_queue(
            &leave_as(&first),
            clock.as_ref(),
            &log,
            &cache,
            &catalog,
            &catalog,
        )
        .await
        .unwrap();
        manual.set(t0 + TimeDelta::minutes(10) + TimeDelta::seconds(30));

        // Act
        let before = get_ride_queue_state(&ride, clock.as_ref(), &log, &cache)
            .await
            .unwrap();
        let result = handle_leave_queue(
            &leave_as(&second),
            clock.as_ref(),
            &log,
            &cache,
            &catalog,
            &catalog,
        )
        .await;

        // Assert
        assert_eq!(joined.customer.window_end, Some(t0 + TimeDelta::minutes(11)));
        assert_eq!(before.queue_count, 1);
        assert!(before.is_waiting(second.id));
        let left = result.unwrap();
        assert_eq!(left.ride.queue_count, 0);
        assert!(!left.customer.is_queueing);
    }

    #[test]
    fn test_precondition_failures_are_not_logged_as_errors() {
        let levels = levels_logged_for(&DomainError::NotQueued(Uuid::new_v4()));

        assert_eq!(levels, vec![Level::INFO]);
    }

    #[test]
    fn test_infrastructure_failures_are_logged_as_errors() {
        let levels = levels_logged_for(&DomainError::Infrastructure("disk full".to_owned()));

        assert_eq!(levels, vec![Level::ERROR]);
    }
}
