//! Domain layer for the Customer Queue context.

pub mod aggregates;
pub mod commands;
pub mod events;
