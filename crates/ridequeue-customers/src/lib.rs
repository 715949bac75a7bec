//! Customer Queue bounded context.
//!
//! Tracks whether a customer is waiting for a ride and the window during
//! which they occupy a queue and service slot.

pub mod application;
pub mod domain;
