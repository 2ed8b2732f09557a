//! Recurrence rules for scheduled events: parsing and occurrence enumeration.
//!
//! A rule is parsed once from its `KEY=VALUE;...` text form into a
//! [`RecurrenceRule`] and then enumerated against an anchor start time and a
//! query window. Enumeration is pure and always bounded.

pub mod enumerate;
pub mod error;
pub mod parse;
pub mod rule;

pub use enumerate::{Occurrences, enumerate, occurrence_on, series};
pub use error::{RuleError, RuleResult};
pub use parse::parse;
pub use rule::{Frequency, RecurrenceRule, WeekdaySelector};
