//! Gregorian calendar helpers for period resolution.

use chrono::{Datelike, Days, NaiveDate};

use crate::rule::{RecurrenceRule, WeekdaySelector};

/// Monday of the week containing `date`.
pub(super) fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
}

/// Adds `months` to a (year, 1-based month) pair.
pub(super) fn add_months(year: i32, month: u32, months: u32) -> Option<(i32, u32)> {
    let total = i64::from(year) * 12 + i64::from(month) - 1 + i64::from(months);
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    Some((year, month))
}

pub(super) fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = add_months(year, month, 1)?;
    Some(
        NaiveDate::from_ymd_opt(next_year, next_month, 1)?
            .pred_opt()?
            .day(),
    )
}

/// Returns true if `date` satisfies `selector` within its month.
pub(super) fn selector_matches(selector: WeekdaySelector, date: NaiveDate, month_len: u32) -> bool {
    if selector.weekday != date.weekday() {
        return false;
    }
    let Some(ordinal) = selector.ordinal else {
        return true;
    };
    let day = date.day();
    let from_start = (day - 1) / 7 + 1;
    let from_end = (month_len - day) / 7 + 1;
    match u32::try_from(ordinal) {
        Ok(n) => from_start == n,
        Err(_) => from_end == u32::from(ordinal.unsigned_abs()),
    }
}

/// Resolves the days of one month that a monthly or yearly rule selects.
///
/// `BYMONTHDAY` picks a single day (skipped when the month is too short),
/// `BYDAY` alone scans the whole month, and with neither the anchor's
/// day-of-month is used. When `BYDAY` is present every candidate must match
/// one of its selectors.
pub(super) fn month_days(
    rule: &RecurrenceRule,
    year: i32,
    month: u32,
    anchor_day: u32,
) -> Option<Vec<NaiveDate>> {
    let month_len = days_in_month(year, month)?;

    let candidates: Vec<u32> = match rule.by_month_day {
        Some(day) => vec![u32::from(day)],
        None if !rule.by_day.is_empty() => (1..=month_len).collect(),
        None => vec![anchor_day],
    };

    Some(
        candidates
            .into_iter()
            .filter(|day| *day <= month_len)
            .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
            .filter(|date| {
                rule.by_day.is_empty()
                    || rule
                        .by_day
                        .iter()
                        .any(|selector| selector_matches(*selector, *date, month_len))
            })
            .collect(),
    )
}
