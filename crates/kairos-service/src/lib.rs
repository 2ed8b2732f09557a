//! Recurring-schedule occurrence engine: window expansion over sparse
//! per-date exceptions, and single-instance edits and deletions with
//! automatic retirement of exhausted series.

pub mod error;
pub mod recurrence;
pub mod store;
