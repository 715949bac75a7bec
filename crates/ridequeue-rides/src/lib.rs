//! Ride Queue bounded context.
//!
//! Responsible for how many customers wait for each ride and when the next
//! customer to join would be served.

pub mod application;
pub mod domain;
