//! Shared building blocks for the kairos recurrence engine.

pub mod config;
pub mod error;
pub mod types;
