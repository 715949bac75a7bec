//! Persistence collaborators for ridequeue.
//!
//! PostgreSQL-backed implementations of the event log and the reference data
//! catalogs, plus in-memory equivalents for local runs and tests.

pub mod memory;
pub mod pg_catalog;
pub mod pg_event_log;
pub mod schema;
