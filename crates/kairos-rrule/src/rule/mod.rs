//! Structured recurrence rule value type.

use std::fmt;

use chrono::{DateTime, Utc, Weekday};

/// Recurrence frequency.
///
/// The set is closed: every enumeration path matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the rule-text representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency from rule text (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the two-letter rule code for a weekday.
#[must_use]
pub const fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Parses a two-letter weekday code (case-insensitive).
#[must_use]
pub fn parse_weekday_code(s: &str) -> Option<Weekday> {
    Some(match s.to_ascii_uppercase().as_str() {
        "MO" => Weekday::Mon,
        "TU" => Weekday::Tue,
        "WE" => Weekday::Wed,
        "TH" => Weekday::Thu,
        "FR" => Weekday::Fri,
        "SA" => Weekday::Sat,
        "SU" => Weekday::Sun,
        _ => return None,
    })
}

/// Weekday with optional month-relative ordinal.
///
/// - `MO` - every Monday
/// - `1MO` - first Monday of the month
/// - `-1FR` - last Friday of the month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdaySelector {
    /// Occurrence within the month: `1..=5` from the start, `-5..=-1` from the end.
    pub ordinal: Option<i8>,
    pub weekday: Weekday,
}

impl WeekdaySelector {
    /// Largest ordinal magnitude a month can satisfy.
    pub const MAX_ORDINAL: i8 = 5;

    /// Selects every `weekday`.
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// Selects the `ordinal`th `weekday` of the month. Callers are expected to
    /// pass a nonzero ordinal within `-5..=5`; the parser enforces this for rule text.
    #[must_use]
    pub const fn nth(ordinal: i8, weekday: Weekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

impl fmt::Display for WeekdaySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        f.write_str(weekday_code(self.weekday))
    }
}

/// Parsed, validated recurrence rule.
///
/// When both `count` and `until` are set, `count` is authoritative: the series
/// never exceeds `count` occurrences even if `until` would still allow more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Every Nth period; always at least 1.
    pub interval: u32,
    /// Weekday selectors, in the order given, without duplicates.
    pub by_day: Vec<WeekdaySelector>,
    /// Day of month (1-31).
    pub by_month_day: Option<u8>,
    /// Month of year (1-12).
    pub by_month: Option<u8>,
    /// Hard cap on the number of occurrences the rule ever produces.
    pub count: Option<u32>,
    /// No occurrence starts after this instant (inclusive bound).
    pub until: Option<DateTime<Utc>>,
}

impl RecurrenceRule {
    /// Creates a rule with the given frequency and no selectors or bounds.
    #[must_use]
    pub const fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            by_day: Vec::new(),
            by_month_day: None,
            by_month: None,
            count: None,
            until: None,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval.max(1);
        self
    }

    #[must_use]
    pub fn with_by_day(mut self, days: Vec<WeekdaySelector>) -> Self {
        self.by_day = days;
        self
    }

    #[must_use]
    pub fn with_by_month_day(mut self, day: u8) -> Self {
        self.by_month_day = Some(day);
        self
    }

    #[must_use]
    pub fn with_by_month(mut self, month: u8) -> Self {
        self.by_month = Some(month);
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Narrows `until` to the earlier of the current bound and `until`.
    #[must_use]
    pub fn clamp_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(self.until.map_or(until, |current| current.min(until)));
        self
    }

    /// Returns true if the full series is finite (`COUNT` or `UNTIL` present).
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.count.is_some() || self.until.is_some()
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.frequency)?;

        if self.interval != 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }

        if !self.by_day.is_empty() {
            let days: Vec<_> = self.by_day.iter().map(ToString::to_string).collect();
            write!(f, ";BYDAY={}", days.join(","))?;
        }

        if let Some(day) = self.by_month_day {
            write!(f, ";BYMONTHDAY={day}")?;
        }

        if let Some(month) = self.by_month {
            write!(f, ";BYMONTH={month}")?;
        }

        if let Some(count) = self.count {
            write!(f, ";COUNT={count}")?;
        }

        if let Some(until) = self.until {
            write!(f, ";UNTIL={}", until.format(crate::parse::UNTIL_FORMAT_UTC))?;
        }

        Ok(())
    }
}
