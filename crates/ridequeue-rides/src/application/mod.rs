//! Application layer for the Ride Queue context.

pub mod command_handlers;
pub mod query_handlers;
