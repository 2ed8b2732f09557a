//! Rule text parser.
//!
//! Grammar: `KEY=VALUE` parts joined by `;`. Recognized keys are `FREQ`,
//! `INTERVAL`, `BYDAY`, `BYMONTHDAY`, `BYMONTH`, `COUNT` and `UNTIL`. Anything
//! else is rejected so that typos never silently change a series.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{RuleError, RuleResult};
use crate::rule::{Frequency, RecurrenceRule, WeekdaySelector, parse_weekday_code};

/// `UNTIL` timestamp layout (no offset; the value is already UTC).
pub const UNTIL_FORMAT: &str = "%Y%m%dT%H%M%S";
/// `UNTIL` layout as written back out by `RecurrenceRule`'s `Display`.
pub const UNTIL_FORMAT_UTC: &str = "%Y%m%dT%H%M%SZ";
/// Date-only `UNTIL` layout; the bound is the last second of that day.
pub const UNTIL_DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKey {
    Freq,
    Interval,
    ByDay,
    ByMonthDay,
    ByMonth,
    Count,
    Until,
}

impl RuleKey {
    fn parse(s: &str) -> RuleResult<Self> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "FREQ" => Self::Freq,
            "INTERVAL" => Self::Interval,
            "BYDAY" => Self::ByDay,
            "BYMONTHDAY" => Self::ByMonthDay,
            "BYMONTH" => Self::ByMonth,
            "COUNT" => Self::Count,
            "UNTIL" => Self::Until,
            _ => return Err(RuleError::UnknownRuleKey(s.to_string())),
        })
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Freq => "FREQ",
            Self::Interval => "INTERVAL",
            Self::ByDay => "BYDAY",
            Self::ByMonthDay => "BYMONTHDAY",
            Self::ByMonth => "BYMONTH",
            Self::Count => "COUNT",
            Self::Until => "UNTIL",
        }
    }
}

/// Rule parts collected before cross-field validation.
#[derive(Debug, Default)]
struct RuleParts {
    frequency: Option<Frequency>,
    interval: Option<u32>,
    by_day: Vec<WeekdaySelector>,
    by_month_day: Option<u8>,
    by_month: Option<u8>,
    count: Option<u32>,
    until: Option<DateTime<Utc>>,
}

/// ## Summary
/// Parses and validates recurrence rule text.
///
/// ## Errors
/// Returns the `RuleError` kind matching the first invalid part, or a
/// cross-field error (`MissingFrequency`, `UnsupportedSelector`,
/// `InvalidMonthDay`) once all parts are read.
///
/// ## Side Effects
/// None.
pub fn parse(rule_text: &str) -> RuleResult<RecurrenceRule> {
    let mut parts = RuleParts::default();
    let mut seen: Vec<RuleKey> = Vec::with_capacity(7);

    // A trailing `;` leaves an empty part, which carries no information.
    for part in rule_text.trim().split(';').filter(|p| !p.trim().is_empty()) {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| RuleError::MalformedPart(part.to_string()))?;
        let key = RuleKey::parse(key.trim())?;
        let value = value.trim();
        if value.is_empty() {
            return Err(RuleError::MalformedPart(part.to_string()));
        }
        if seen.contains(&key) {
            return Err(RuleError::DuplicateRuleKey(key.as_str().to_string()));
        }
        seen.push(key);

        parse_part(&mut parts, key, value)?;
    }

    validate(parts)
}

fn parse_part(parts: &mut RuleParts, key: RuleKey, value: &str) -> RuleResult<()> {
    match key {
        RuleKey::Freq => {
            parts.frequency = Some(
                Frequency::parse(value)
                    .ok_or_else(|| RuleError::InvalidFrequency(value.to_string()))?,
            );
        }
        RuleKey::Interval => {
            parts.interval = Some(
                parse_positive(value).ok_or_else(|| RuleError::InvalidInterval(value.to_string()))?,
            );
        }
        RuleKey::Count => {
            parts.count = Some(
                parse_positive(value).ok_or_else(|| RuleError::InvalidCount(value.to_string()))?,
            );
        }
        RuleKey::ByDay => parts.by_day = parse_by_day(value)?,
        RuleKey::ByMonthDay => {
            parts.by_month_day = Some(
                parse_in_range(value, 1, 31)
                    .ok_or_else(|| RuleError::InvalidMonthDay(value.to_string()))?,
            );
        }
        RuleKey::ByMonth => {
            parts.by_month = Some(
                parse_in_range(value, 1, 12)
                    .ok_or_else(|| RuleError::InvalidMonth(value.to_string()))?,
            );
        }
        RuleKey::Until => parts.until = Some(parse_until(value)?),
    }
    Ok(())
}

/// Parses an integer that must be at least 1.
fn parse_positive(value: &str) -> Option<u32> {
    let n: i64 = value.parse().ok()?;
    if n < 1 {
        return None;
    }
    u32::try_from(n).ok()
}

fn parse_in_range(value: &str, min: u8, max: u8) -> Option<u8> {
    let n: i64 = value.parse().ok()?;
    let n = u8::try_from(n).ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parses a BYDAY value (weekdays with optional ordinals), dropping repeats.
fn parse_by_day(value: &str) -> RuleResult<Vec<WeekdaySelector>> {
    let mut selectors = Vec::new();
    for token in value.split(',') {
        let selector = parse_weekday_selector(token.trim())?;
        if !selectors.contains(&selector) {
            selectors.push(selector);
        }
    }
    Ok(selectors)
}

/// Parses a single selector such as `MO`, `1MO`, `+2TU` or `-1FR`.
fn parse_weekday_selector(token: &str) -> RuleResult<WeekdaySelector> {
    let invalid = || RuleError::InvalidWeekdaySelector(token.to_string());

    if token.len() < 2 || !token.is_ascii() {
        return Err(invalid());
    }

    let (ordinal_str, code) = token.split_at(token.len() - 2);
    let weekday = parse_weekday_code(code).ok_or_else(invalid)?;

    if ordinal_str.is_empty() {
        return Ok(WeekdaySelector::every(weekday));
    }

    let ordinal: i8 = ordinal_str.parse().map_err(|_err| invalid())?;
    if ordinal == 0 || ordinal.abs() > WeekdaySelector::MAX_ORDINAL {
        return Err(invalid());
    }
    Ok(WeekdaySelector::nth(ordinal, weekday))
}

/// Parses `UNTIL` as `YYYYMMDDTHHMMSS[Z]` or a date-only `YYYYMMDD`.
fn parse_until(value: &str) -> RuleResult<DateTime<Utc>> {
    let invalid = || RuleError::InvalidUntil(value.to_string());
    let stripped = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .unwrap_or(value);

    if stripped.contains(['T', 't']) {
        return NaiveDateTime::parse_from_str(&stripped.to_ascii_uppercase(), UNTIL_FORMAT)
            .map(|dt| dt.and_utc())
            .map_err(|_err| invalid());
    }

    // A trailing Z on a bare date is meaningless.
    if stripped.len() != value.len() {
        return Err(invalid());
    }
    let date = NaiveDate::parse_from_str(stripped, UNTIL_DATE_FORMAT).map_err(|_err| invalid())?;
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(invalid)?;
    Ok(date.and_time(last_second).and_utc())
}

/// Longest month length for each month, counting February in leap years.
const MAX_MONTH_DAYS: [u8; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn validate(parts: RuleParts) -> RuleResult<RecurrenceRule> {
    let frequency = parts.frequency.ok_or(RuleError::MissingFrequency)?;
    let unsupported = |selector: &'static str| RuleError::UnsupportedSelector {
        selector,
        frequency,
    };

    match frequency {
        Frequency::Daily | Frequency::Weekly => {
            if parts.by_month_day.is_some() {
                return Err(unsupported("BYMONTHDAY"));
            }
            if parts.by_month.is_some() {
                return Err(unsupported("BYMONTH"));
            }
            if parts.by_day.iter().any(|s| s.ordinal.is_some()) {
                return Err(unsupported("BYDAY ordinal"));
            }
        }
        Frequency::Monthly => {
            if parts.by_month.is_some() {
                return Err(unsupported("BYMONTH"));
            }
        }
        Frequency::Yearly => {
            if let (Some(month), Some(day)) = (parts.by_month, parts.by_month_day) {
                let longest = MAX_MONTH_DAYS[usize::from(month - 1)];
                if day > longest {
                    return Err(RuleError::InvalidMonthDay(format!(
                        "{day} never occurs in month {month}"
                    )));
                }
            }
        }
    }

    Ok(RecurrenceRule {
        frequency,
        interval: parts.interval.unwrap_or(1),
        by_day: parts.by_day,
        by_month_day: parts.by_month_day,
        by_month: parts.by_month,
        count: parts.count,
        until: parts.until,
    })
}
