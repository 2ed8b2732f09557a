use thiserror::Error;

use crate::rule::Frequency;

/// Errors raised while parsing or validating recurrence rule text.
///
/// Each variant carries the offending fragment of the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Rule has no FREQ part")]
    MissingFrequency,

    #[error("Invalid weekday selector: {0}")]
    InvalidWeekdaySelector(String),

    #[error("Invalid count: {0}")]
    InvalidCount(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid day of month: {0}")]
    InvalidMonthDay(String),

    #[error("Invalid month: {0}")]
    InvalidMonth(String),

    #[error("Invalid UNTIL timestamp: {0}")]
    InvalidUntil(String),

    #[error("Unknown rule key: {0}")]
    UnknownRuleKey(String),

    #[error("Rule key given more than once: {0}")]
    DuplicateRuleKey(String),

    #[error("Malformed rule part: {0:?}")]
    MalformedPart(String),

    #[error("{selector} is not supported for FREQ={frequency}")]
    UnsupportedSelector {
        selector: &'static str,
        frequency: Frequency,
    },
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;
