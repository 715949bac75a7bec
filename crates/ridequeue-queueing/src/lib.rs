//! Queueing orchestration.
//!
//! A customer joining or leaving a ride queue touches two aggregates with
//! independent event streams and cache entries. No transaction spans both,
//! so the join path records an undo action for every completed step and
//! unwinds them if a later step fails.

pub mod application;
pub mod domain;
