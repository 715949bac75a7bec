//! Domain layer for the Ride Queue context.

pub mod aggregates;
pub mod commands;
pub mod events;
