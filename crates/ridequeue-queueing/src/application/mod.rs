//! Application layer for queueing orchestration.

pub mod command_handlers;
pub mod compensation;
pub mod query_handlers;
