use chrono::{NaiveDate, TimeZone};
use kairos_core::types::DateRange;

use super::*;
use crate::parse::parse;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dates(occurrences: impl Iterator<Item = DateTime<Utc>>) -> Vec<NaiveDate> {
    occurrences.map(|o| o.date_naive()).collect()
}

fn days(first: NaiveDate, last: NaiveDate) -> DateRange {
    DateRange::days(first, last).unwrap()
}

#[test]
fn weekly_count_clips_a_wide_window() {
    let rule = parse("FREQ=WEEKLY;BYDAY=MO;COUNT=5").unwrap();
    let anchor = at(2024, 1, 1, 10, 0);
    let window = days(date(2024, 1, 1), date(2024, 3, 31));

    let occurrences: Vec<_> = enumerate(&rule, anchor, window).collect();
    assert_eq!(
        occurrences,
        vec![
            at(2024, 1, 1, 10, 0),
            at(2024, 1, 8, 10, 0),
            at(2024, 1, 15, 10, 0),
            at(2024, 1, 22, 10, 0),
            at(2024, 1, 29, 10, 0),
        ]
    );
}

#[test]
fn weekly_anchor_not_matching_is_not_emitted() {
    // 2024-01-01 is a Monday.
    let rule = parse("FREQ=WEEKLY;BYDAY=TU,WE").unwrap();
    let anchor = at(2024, 1, 1, 9, 30);
    let window = days(date(2023, 12, 1), date(2024, 1, 14));

    assert_eq!(
        dates(enumerate(&rule, anchor, window)),
        vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 9), date(2024, 1, 10)]
    );
}

#[test]
fn weekly_anchor_mid_week_skips_earlier_days() {
    // Anchored Wednesday; Monday of that week precedes the anchor.
    let rule = parse("FREQ=WEEKLY;BYDAY=MO,FR;COUNT=3").unwrap();
    let anchor = at(2024, 1, 3, 8, 0);

    assert_eq!(
        dates(series(&rule, anchor)),
        vec![date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 12)]
    );
}

#[test]
fn weekly_interval_without_byday_uses_anchor_weekday() {
    let rule = parse("FREQ=WEEKLY;INTERVAL=2;COUNT=3").unwrap();
    let anchor = at(2024, 1, 4, 12, 0);

    assert_eq!(
        dates(series(&rule, anchor)),
        vec![date(2024, 1, 4), date(2024, 1, 18), date(2024, 2, 1)]
    );
}

#[test]
fn daily_interval_preserves_time_of_day() {
    let rule = parse("FREQ=DAILY;INTERVAL=2;COUNT=4").unwrap();
    let anchor = at(2024, 2, 27, 7, 45);

    let occurrences: Vec<_> = series(&rule, anchor).collect();
    assert_eq!(
        occurrences,
        vec![
            at(2024, 2, 27, 7, 45),
            at(2024, 2, 29, 7, 45),
            at(2024, 3, 2, 7, 45),
            at(2024, 3, 4, 7, 45),
        ]
    );
}

#[test]
fn daily_byday_filters_weekdays() {
    let rule = parse("FREQ=DAILY;BYDAY=SA,SU;COUNT=3").unwrap();
    let anchor = at(2024, 1, 1, 10, 0);

    assert_eq!(
        dates(series(&rule, anchor)),
        vec![date(2024, 1, 6), date(2024, 1, 7), date(2024, 1, 13)]
    );
}

#[test]
fn monthly_month_day_skips_short_months() {
    let rule = parse("FREQ=MONTHLY;BYMONTHDAY=31;COUNT=5").unwrap();
    let anchor = at(2024, 1, 31, 18, 0);

    assert_eq!(
        dates(series(&rule, anchor)),
        vec![
            date(2024, 1, 31),
            date(2024, 3, 31),
            date(2024, 5, 31),
            date(2024, 7, 31),
            date(2024, 8, 31),
        ]
    );
}

#[test]
fn monthly_without_selectors_uses_anchor_day() {
    let rule = parse("FREQ=MONTHLY;INTERVAL=3;COUNT=3").unwrap();
    let anchor = at(2024, 1, 15, 9, 0);

    assert_eq!(
        dates(series(&rule, anchor)),
        vec![date(2024, 1, 15), date(2024, 4, 15), date(2024, 7, 15)]
    );
}

#[test]
fn monthly_first_monday_and_last_friday() {
    let anchor = at(2024, 1, 1, 10, 0);

    let first_monday = parse("FREQ=MONTHLY;BYDAY=1MO;COUNT=3").unwrap();
    assert_eq!(
        dates(series(&first_monday, anchor)),
        vec![date(2024, 1, 1), date(2024, 2, 5), date(2024, 3, 4)]
    );

    let last_friday = parse("FREQ=MONTHLY;BYDAY=-1FR;COUNT=3").unwrap();
    assert_eq!(
        dates(series(&last_friday, anchor)),
        vec![date(2024, 1, 26), date(2024, 2, 23), date(2024, 3, 29)]
    );
}

#[test]
fn monthly_fifth_weekday_skips_months_without_one() {
    // Fifth Thursday: Feb 29 2024 and May 30 2024; March/April have none.
    let rule = parse("FREQ=MONTHLY;BYDAY=5TH;COUNT=2").unwrap();
    let anchor = at(2024, 2, 1, 10, 0);

    assert_eq!(
        dates(series(&rule, anchor)),
        vec![date(2024, 2, 29), date(2024, 5, 30)]
    );
}

#[test]
fn yearly_leap_day() {
    let rule = parse("FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=29;COUNT=3").unwrap();
    let anchor = at(2024, 2, 29, 12, 0);

    assert_eq!(
        dates(series(&rule, anchor)),
        vec![date(2024, 2, 29), date(2028, 2, 29), date(2032, 2, 29)]
    );
}

#[test]
fn yearly_ordinal_weekday_in_month() {
    // Fourth Thursday of November.
    let rule = parse("FREQ=YEARLY;BYMONTH=11;BYDAY=4TH;COUNT=3").unwrap();
    let anchor = at(2024, 1, 1, 16, 0);

    assert_eq!(
        dates(series(&rule, anchor)),
        vec![date(2024, 11, 28), date(2025, 11, 27), date(2026, 11, 26)]
    );
}

#[test]
fn yearly_interval_defaults_to_anchor_month_and_day() {
    let rule = parse("FREQ=YEARLY;INTERVAL=2;COUNT=3").unwrap();
    let anchor = at(2024, 6, 10, 8, 0);

    assert_eq!(
        dates(series(&rule, anchor)),
        vec![date(2024, 6, 10), date(2026, 6, 10), date(2028, 6, 10)]
    );
}

#[test_log::test]
fn count_holds_across_disjoint_windows() {
    let rule = parse("FREQ=DAILY;COUNT=10").unwrap();
    let anchor = at(2024, 1, 1, 10, 0);

    let windows = [
        days(date(2024, 1, 1), date(2024, 1, 3)),
        days(date(2024, 1, 4), date(2024, 1, 8)),
        days(date(2024, 1, 9), date(2024, 12, 31)),
    ];
    let counts: Vec<usize> = windows
        .iter()
        .map(|window| enumerate(&rule, anchor, *window).count())
        .collect();

    assert_eq!(counts, vec![3, 5, 2]);
    assert_eq!(counts.iter().sum::<usize>(), 10);
    assert_eq!(series(&rule, anchor).count(), 10);
}

#[test]
fn window_after_count_is_exhausted_is_empty() {
    let rule = parse("FREQ=WEEKLY;BYDAY=MO;COUNT=5").unwrap();
    let anchor = at(2024, 1, 1, 10, 0);
    let window = days(date(2024, 2, 1), date(2024, 12, 31));

    assert_eq!(enumerate(&rule, anchor, window).next(), None);
}

#[test]
fn count_takes_precedence_over_until() {
    let rule = parse("FREQ=DAILY;COUNT=5;UNTIL=20300101T000000Z").unwrap();
    let anchor = at(2024, 1, 1, 10, 0);

    let occurrences: Vec<_> = series(&rule, anchor).collect();
    assert_eq!(occurrences.len(), 5);
    assert!(occurrences.iter().all(|o| *o < rule.until.unwrap()));
}

#[test]
fn until_is_inclusive_and_terminates() {
    let rule = parse("FREQ=DAILY;UNTIL=20240105T100000Z").unwrap();
    let anchor = at(2024, 1, 1, 10, 0);

    assert_eq!(
        dates(series(&rule, anchor)),
        vec![
            date(2024, 1, 1),
            date(2024, 1, 2),
            date(2024, 1, 3),
            date(2024, 1, 4),
            date(2024, 1, 5),
        ]
    );
}

#[test]
fn window_bounds_are_inclusive() {
    let rule = parse("FREQ=DAILY").unwrap();
    let anchor = at(2024, 1, 1, 10, 0);
    let window = DateRange::new(at(2024, 1, 2, 10, 0), at(2024, 1, 4, 10, 0)).unwrap();

    assert_eq!(
        dates(enumerate(&rule, anchor, window)),
        vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)]
    );
}

#[test]
fn window_before_anchor_is_empty() {
    let rule = parse("FREQ=DAILY").unwrap();
    let anchor = at(2024, 1, 1, 10, 0);
    let window = days(date(2023, 1, 1), date(2023, 12, 31));

    assert_eq!(enumerate(&rule, anchor, window).count(), 0);
}

#[test]
fn enumeration_is_restartable_and_increasing() {
    let rule = parse("FREQ=WEEKLY;BYDAY=MO,WE,FR").unwrap();
    let anchor = at(2024, 1, 1, 10, 0);
    let window = days(date(2024, 1, 1), date(2024, 6, 30));

    let first: Vec<_> = enumerate(&rule, anchor, window).collect();
    let second: Vec<_> = enumerate(&rule, anchor, window).collect();
    assert_eq!(first, second);
    assert!(first.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test_log::test]
fn impossible_selectors_terminate() {
    // Every 7th day from a Monday is always a Monday.
    let rule = parse("FREQ=DAILY;INTERVAL=7;BYDAY=TU;COUNT=3").unwrap();
    let anchor = at(2024, 1, 1, 10, 0);

    assert_eq!(series(&rule, anchor).count(), 0);
}

#[test]
fn occurrence_on_matches_only_real_dates() {
    let rule = parse("FREQ=WEEKLY;BYDAY=MO;COUNT=5").unwrap();
    let anchor = at(2024, 1, 1, 10, 0);

    assert_eq!(
        occurrence_on(&rule, anchor, date(2024, 1, 8)),
        Some(at(2024, 1, 8, 10, 0))
    );
    assert_eq!(occurrence_on(&rule, anchor, date(2024, 1, 9)), None);
    // Sixth Monday is beyond COUNT.
    assert_eq!(occurrence_on(&rule, anchor, date(2024, 2, 5)), None);
}
