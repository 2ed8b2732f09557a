use chrono::{DateTime, Utc};
use rrule::RRuleSet;

/// A rule whose series must agree with the `rrule` crate's RFC 5545 expansion.
pub struct RRuleCase {
    pub name: &'static str,
    pub anchor: &'static str,
    pub rule: &'static str,
    pub limit: u16,
}

#[expect(clippy::too_many_lines)]
pub fn rrule_cases() -> Vec<RRuleCase> {
    vec![
        RRuleCase {
            name: "daily_basic",
            anchor: "2012-02-01T09:30:00Z",
            rule: "FREQ=DAILY;COUNT=3",
            limit: 100,
        },
        RRuleCase {
            name: "daily_interval",
            anchor: "2024-01-01T10:00:00Z",
            rule: "FREQ=DAILY;INTERVAL=3;COUNT=4",
            limit: 100,
        },
        RRuleCase {
            name: "daily_weekday_filter",
            anchor: "2024-01-01T10:00:00Z",
            rule: "FREQ=DAILY;BYDAY=MO,FR;COUNT=4",
            limit: 100,
        },
        RRuleCase {
            name: "daily_until",
            anchor: "2024-01-01T10:00:00Z",
            rule: "FREQ=DAILY;UNTIL=20240105T100000Z",
            limit: 100,
        },
        RRuleCase {
            name: "weekly_basic",
            anchor: "1997-09-02T09:00:00Z",
            rule: "FREQ=WEEKLY;COUNT=3;BYDAY=TU,TH",
            limit: 100,
        },
        RRuleCase {
            name: "weekly_mwf",
            anchor: "2024-01-01T10:00:00Z",
            rule: "FREQ=WEEKLY;BYDAY=MO,WE,FR;COUNT=10",
            limit: 100,
        },
        RRuleCase {
            name: "weekly_anchor_not_matching",
            anchor: "2024-01-01T10:00:00Z",
            rule: "FREQ=WEEKLY;BYDAY=TU,WE;COUNT=4",
            limit: 100,
        },
        RRuleCase {
            name: "weekly_biweekly",
            anchor: "1997-09-02T09:00:00Z",
            rule: "FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH;COUNT=6",
            limit: 100,
        },
        RRuleCase {
            name: "monthly_basic",
            anchor: "2012-01-01T09:00:00Z",
            rule: "FREQ=MONTHLY;COUNT=3;BYMONTHDAY=1",
            limit: 100,
        },
        RRuleCase {
            name: "monthly_31st",
            anchor: "2024-01-31T18:00:00Z",
            rule: "FREQ=MONTHLY;BYMONTHDAY=31;COUNT=5",
            limit: 100,
        },
        RRuleCase {
            name: "monthly_anchor_day_skips",
            anchor: "2024-01-31T08:00:00Z",
            rule: "FREQ=MONTHLY;COUNT=4",
            limit: 100,
        },
        RRuleCase {
            name: "monthly_first_monday",
            anchor: "2024-01-01T10:00:00Z",
            rule: "FREQ=MONTHLY;BYDAY=1MO;COUNT=3",
            limit: 100,
        },
        RRuleCase {
            name: "monthly_last_friday",
            anchor: "2024-01-01T10:00:00Z",
            rule: "FREQ=MONTHLY;BYDAY=-1FR;COUNT=3",
            limit: 100,
        },
        RRuleCase {
            name: "yearly_basic",
            anchor: "2012-01-01T09:00:00Z",
            rule: "FREQ=YEARLY;COUNT=3",
            limit: 100,
        },
        RRuleCase {
            name: "yearly_leap_day",
            anchor: "2024-02-29T12:00:00Z",
            rule: "FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=29;COUNT=3",
            limit: 100,
        },
        RRuleCase {
            name: "yearly_thanksgiving",
            anchor: "2024-01-01T16:00:00Z",
            rule: "FREQ=YEARLY;BYMONTH=11;BYDAY=4TH;COUNT=3",
            limit: 100,
        },
    ]
}

pub fn assert_case(case: &RRuleCase) {
    let anchor = parse_rfc3339(case.anchor);

    let reference_text = format!(
        "DTSTART:{}\nRRULE:{}",
        anchor.format("%Y%m%dT%H%M%SZ"),
        case.rule
    );
    let reference: RRuleSet = reference_text
        .parse()
        .unwrap_or_else(|err| panic!("Failed to parse {}: {}", case.name, err));
    let expected: Vec<i64> = reference
        .all(case.limit)
        .dates
        .iter()
        .map(chrono::DateTime::timestamp)
        .collect();

    let rule = crate::parse::parse(case.rule)
        .unwrap_or_else(|err| panic!("Failed to parse {}: {}", case.name, err));
    let actual: Vec<i64> = crate::enumerate::series(&rule, anchor)
        .take(usize::from(case.limit))
        .map(|occurrence| occurrence.timestamp())
        .collect();

    assert!(!actual.is_empty(), "Case {} produced no occurrences", case.name);
    assert_eq!(actual, expected, "Case {} did not match", case.name);
}

fn parse_rfc3339(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .unwrap_or_else(|err| panic!("Failed to parse rfc3339 value {value}: {err}"))
        .with_timezone(&Utc)
}
