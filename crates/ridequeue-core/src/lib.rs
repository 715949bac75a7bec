//! Shared queue-state abstractions.
//!
//! This crate defines the event record and its encode/decode contract, the
//! replay contract every aggregate implements, the event log and catalog
//! traits the persistence layer fulfils, and the state cache shared by both
//! aggregates. It contains no infrastructure code.

pub mod aggregate;
pub mod cache;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod repository;
