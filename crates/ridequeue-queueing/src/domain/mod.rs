//! Domain layer for queueing orchestration.

pub mod commands;
