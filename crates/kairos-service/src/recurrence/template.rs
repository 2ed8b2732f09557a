//! Parsed view of a recurring template and the instances it projects.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use kairos_core::types::DateRange;
use kairos_rrule::{Occurrences, RecurrenceRule};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{Payload, TemplateRecord};

/// A template whose rule has been parsed once for the lifetime of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringTemplate {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub anchor_start: DateTime<Utc>,
    pub duration: TimeDelta,
    /// Rule with the record-level `until` already folded in.
    pub rule: RecurrenceRule,
    pub details: Payload,
}

impl RecurringTemplate {
    /// ## Summary
    /// Parses the record's rule text and folds the record-level `until` into
    /// it, keeping the earlier of the two bounds.
    ///
    /// ## Errors
    /// Returns `ServiceError::NotRecurring` if the record has no rule, or
    /// `ServiceError::RuleError` if the stored rule text is invalid.
    pub fn from_record(record: TemplateRecord) -> ServiceResult<Self> {
        let Some(rule_text) = record.recurrence_rule.as_deref() else {
            return Err(ServiceError::NotRecurring(record.id));
        };
        let mut rule = kairos_rrule::parse(rule_text)?;
        if let Some(until) = record.until {
            rule = rule.clamp_until(until);
        }

        Ok(Self {
            id: record.id,
            owner_id: record.owner_id,
            anchor_start: record.anchor_start,
            duration: record.duration,
            rule,
            details: record.details,
        })
    }

    /// Candidate start times within `window`.
    #[must_use]
    pub fn occurrences(&self, window: DateRange) -> Occurrences<'_> {
        kairos_rrule::enumerate(&self.rule, self.anchor_start, window)
    }

    /// Every start time of the series; only finite for bounded rules.
    #[must_use]
    pub fn series(&self) -> Occurrences<'_> {
        kairos_rrule::series(&self.rule, self.anchor_start)
    }

    /// Start time of the occurrence on `date`, if the rule produces one.
    #[must_use]
    pub fn occurrence_on(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        kairos_rrule::occurrence_on(&self.rule, self.anchor_start, date)
    }

    /// ## Summary
    /// Projects the occurrence starting at `start`.
    ///
    /// With `overrides`, the instance content is the template details with
    /// each override key replacing the same-named key. The time slot never
    /// changes.
    #[must_use]
    pub fn instance(&self, start: DateTime<Utc>, overrides: Option<&Payload>) -> VirtualInstance {
        let mut details = self.details.clone();
        if let Some(overrides) = overrides {
            details.extend(overrides.iter().map(|(key, value)| (key.clone(), value.clone())));
        }

        VirtualInstance {
            parent_id: self.id,
            start_time: start,
            end_time: start
                .checked_add_signed(self.duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            overrides_applied: overrides.is_some(),
            details,
        }
    }
}

/// One materialized occurrence. Never persisted; identified by
/// `(parent_id, start_time)`.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualInstance {
    pub parent_id: uuid::Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Whether an exception's overrides were merged into `details`.
    pub overrides_applied: bool,
    pub details: Payload,
}

impl VirtualInstance {
    /// UTC date the occurrence is keyed by.
    #[must_use]
    pub fn occurrence_date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }
}
