//! Application layer for the Customer Queue context.

pub mod command_handlers;
pub mod query_handlers;
