//! Query window shared by the enumerator, expander, and stores.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::{CoreError, CoreResult};

/// Inclusive time window `[start, end]`.
///
/// Both bounds are inclusive: an occurrence starting exactly at `end` is inside
/// the window. Day-granular callers should use [`DateRange::days`], which ends
/// the window at the last representable instant of the final day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// ## Summary
    /// Creates a window from two instants.
    ///
    /// ## Errors
    /// Returns `CoreError::InvalidWindow` if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// ## Summary
    /// Creates a window covering whole UTC days, `first` through `last` inclusive.
    ///
    /// ## Errors
    /// Returns `CoreError::InvalidWindow` if `first` is after `last`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> CoreResult<Self> {
        Self::new(start_of_day(first), end_of_day(last))
    }

    /// Window covering a single UTC day.
    #[must_use]
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: start_of_day(date),
            end: end_of_day(date),
        }
    }

    /// Window from `start` to the end of representable time.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// UTC calendar dates touched by the window, first and last inclusive.
    #[must_use]
    pub fn date_span(&self) -> (NaiveDate, NaiveDate) {
        (self.start.date_naive(), self.end.date_naive())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Midnight UTC at the start of `date`.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

const LAST_INSTANT: NaiveTime = match NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Last representable instant (nanosecond precision) of `date` in UTC.
#[must_use]
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(LAST_INSTANT).and_utc()
}
