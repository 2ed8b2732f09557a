//! Occurrence enumeration.
//!
//! Enumeration always walks forward from the anchor so that `COUNT` is
//! applied to the whole series, no matter which window is being queried. The
//! running count lives in the iterator itself; nothing is carried between calls.

mod calendar;

use std::collections::VecDeque;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc, Weekday};
use kairos_core::types::DateRange;

use crate::rule::{Frequency, RecurrenceRule};

/// Consecutive periods without a single candidate after which enumeration
/// gives up. Reaching it means the selectors can never match again.
pub const MAX_IDLE_PERIODS: u32 = 1000;

/// ## Summary
/// Enumerates occurrences of `rule` anchored at `anchor` whose start time lies
/// within `window` (both ends inclusive).
///
/// The returned iterator is lazy, finite and strictly increasing. It stops at
/// the earliest of the window end, `rule.until`, and the `rule.count`th
/// occurrence of the series.
#[must_use]
pub fn enumerate(rule: &RecurrenceRule, anchor: DateTime<Utc>, window: DateRange) -> Occurrences<'_> {
    Occurrences::new(rule, anchor, window)
}

/// ## Summary
/// Enumerates the whole series from the anchor onward.
///
/// Only finite for bounded rules (`COUNT` or `UNTIL`); callers must cap the
/// iteration themselves for unbounded rules.
#[must_use]
pub fn series(rule: &RecurrenceRule, anchor: DateTime<Utc>) -> Occurrences<'_> {
    Occurrences::new(rule, anchor, DateRange::starting_at(anchor))
}

/// ## Summary
/// Returns the occurrence of the series that falls on `date`, if any.
#[must_use]
pub fn occurrence_on(
    rule: &RecurrenceRule,
    anchor: DateTime<Utc>,
    date: NaiveDate,
) -> Option<DateTime<Utc>> {
    enumerate(rule, anchor, DateRange::day(date)).next()
}

/// Lazy occurrence sequence produced by [`enumerate`].
#[derive(Debug, Clone)]
pub struct Occurrences<'r> {
    rule: &'r RecurrenceRule,
    anchor: DateTime<Utc>,
    anchor_date: NaiveDate,
    time_of_day: NaiveTime,
    /// Weekdays emitted by weekly rules, Monday first.
    week_days: Vec<Weekday>,
    window_start: DateTime<Utc>,
    /// Earlier of the window end and `rule.until`.
    upper: DateTime<Utc>,
    period: u32,
    pending: VecDeque<NaiveDate>,
    /// Occurrences generated since the anchor, including those before the window.
    generated: u32,
    idle_periods: u32,
    done: bool,
}

impl<'r> Occurrences<'r> {
    fn new(rule: &'r RecurrenceRule, anchor: DateTime<Utc>, window: DateRange) -> Self {
        let upper = rule
            .until
            .map_or(window.end(), |until| until.min(window.end()));

        let mut week_days: Vec<Weekday> = if rule.by_day.is_empty() {
            vec![anchor.weekday()]
        } else {
            rule.by_day.iter().map(|s| s.weekday).collect()
        };
        week_days.sort_by_key(Weekday::num_days_from_monday);
        week_days.dedup();

        tracing::trace!(
            rule = %rule,
            anchor = %anchor,
            window = %window,
            "Enumerating occurrences"
        );

        Self {
            rule,
            anchor,
            anchor_date: anchor.date_naive(),
            time_of_day: anchor.time(),
            week_days,
            window_start: window.start(),
            upper,
            period: 0,
            pending: VecDeque::new(),
            generated: 0,
            idle_periods: 0,
            done: upper < anchor,
        }
    }

    /// Candidate dates of one period, ascending. `None` once the calendar
    /// arithmetic leaves the representable range.
    fn period_dates(&self, period: u32) -> Option<Vec<NaiveDate>> {
        let step = period.checked_mul(self.rule.interval)?;
        match self.rule.frequency {
            Frequency::Daily => {
                let date = self
                    .anchor_date
                    .checked_add_days(Days::new(u64::from(step)))?;
                let keep = self.rule.by_day.is_empty()
                    || self.rule.by_day.iter().any(|s| s.weekday == date.weekday());
                Some(if keep { vec![date] } else { Vec::new() })
            }
            Frequency::Weekly => {
                let week_start = calendar::week_start(self.anchor_date)?
                    .checked_add_days(Days::new(u64::from(step) * 7))?;
                self.week_days
                    .iter()
                    .map(|day| {
                        week_start.checked_add_days(Days::new(u64::from(day.num_days_from_monday())))
                    })
                    .collect()
            }
            Frequency::Monthly => {
                let (year, month) =
                    calendar::add_months(self.anchor_date.year(), self.anchor_date.month(), step)?;
                calendar::month_days(self.rule, year, month, self.anchor_date.day())
            }
            Frequency::Yearly => {
                let year = self
                    .anchor_date
                    .year()
                    .checked_add(i32::try_from(step).ok()?)?;
                let month = self
                    .rule
                    .by_month
                    .map_or(self.anchor_date.month(), u32::from);
                calendar::month_days(self.rule, year, month, self.anchor_date.day())
            }
        }
    }

    /// Loads the next period into `pending`. Returns false when enumeration must end.
    fn advance_period(&mut self) -> bool {
        if self.idle_periods >= MAX_IDLE_PERIODS {
            tracing::warn!(
                rule = %self.rule,
                anchor = %self.anchor,
                idle_periods = self.idle_periods,
                "Selectors stopped matching; ending enumeration"
            );
            return false;
        }

        let Some(dates) = self.period_dates(self.period) else {
            tracing::debug!(period = self.period, "Calendar range exhausted");
            return false;
        };
        let Some(next_period) = self.period.checked_add(1) else {
            return false;
        };

        tracing::trace!(period = self.period, candidates = dates.len(), "Period resolved");
        if dates.is_empty() {
            self.idle_periods += 1;
        } else {
            self.idle_periods = 0;
        }
        self.period = next_period;
        self.pending.extend(dates);
        true
    }
}

impl Iterator for Occurrences<'_> {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let Some(date) = self.pending.pop_front() else {
                if !self.advance_period() {
                    self.done = true;
                }
                continue;
            };

            let start = date.and_time(self.time_of_day).and_utc();
            // The first period may begin before the anchor.
            if start < self.anchor {
                continue;
            }
            if start > self.upper {
                self.done = true;
                break;
            }
            if self.rule.count.is_some_and(|count| self.generated >= count) {
                self.done = true;
                break;
            }

            self.generated = self.generated.saturating_add(1);
            if start >= self.window_start {
                return Some(start);
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Occurrences<'_> {}

#[cfg(test)]
mod tests;
