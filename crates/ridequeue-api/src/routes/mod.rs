//! Route modules organized by resource.

pub mod customers;
pub mod health;
pub mod rides;
