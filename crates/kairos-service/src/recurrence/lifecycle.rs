//! Single-occurrence edits and deletions, and retirement of exhausted series.
//!
//! Every operation here issues several reads and writes against one store.
//! Callers must hand in a store that is a single atomic unit (a database
//! transaction or a [`crate::store::memory::MemoryTransaction`]) so that the
//! exhaustion check observes the write that preceded it and nothing else.
//! Mutations take the template through [`RecurrenceStore::lock_template`],
//! which serializes concurrent mutations of one template.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use kairos_core::config::RecurrenceConfig;

use crate::error::{ServiceError, ServiceResult};
use crate::recurrence::template::{RecurringTemplate, VirtualInstance};
use crate::store::{ExceptionRecord, Payload, RecurrenceStore, TemplateRecord};

/// Result of deleting one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The occurrence is hidden; the series continues.
    InstanceDeleted,
    /// Every occurrence of the bounded series is now deleted, so the template
    /// and all of its exceptions were removed.
    TemplateRetired,
}

impl DeleteOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InstanceDeleted => "instance-deleted",
            Self::TemplateRetired => "template-retired",
        }
    }
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for [`RecurrenceLifecycleManager::create_template`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplate {
    pub owner_id: uuid::Uuid,
    pub anchor_start: DateTime<Utc>,
    pub duration: TimeDelta,
    pub recurrence_rule: Option<String>,
    pub until: Option<DateTime<Utc>>,
    pub details: Payload,
}

/// Applies per-occurrence mutations to recurring templates.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceLifecycleManager {
    config: RecurrenceConfig,
}

impl RecurrenceLifecycleManager {
    #[must_use]
    pub const fn new(config: RecurrenceConfig) -> Self {
        Self { config }
    }

    /// ## Summary
    /// Validates and stores a new template.
    ///
    /// The rule text is parsed before anything is written and stored in its
    /// canonical form.
    ///
    /// ## Errors
    /// Returns `ServiceError::RuleError` for invalid rule text,
    /// `ServiceError::ValidationError` for a negative duration, or a store error.
    #[tracing::instrument(skip(self, store, new), fields(owner_id = %new.owner_id))]
    pub async fn create_template<S: RecurrenceStore>(
        &self,
        store: &mut S,
        new: NewTemplate,
    ) -> ServiceResult<TemplateRecord> {
        if new.duration < TimeDelta::zero() {
            return Err(ServiceError::ValidationError(format!(
                "duration must not be negative, got {}s",
                new.duration.num_seconds()
            )));
        }
        let recurrence_rule = match new.recurrence_rule.as_deref() {
            Some(text) => Some(kairos_rrule::parse(text)?.to_string()),
            None => None,
        };

        let record = TemplateRecord {
            id: uuid::Uuid::now_v7(),
            owner_id: new.owner_id,
            anchor_start: new.anchor_start,
            duration: new.duration,
            recurrence_rule,
            until: new.until,
            details: new.details,
        };
        store.insert_template(&record).await?;

        tracing::debug!(
            template_id = %record.id,
            recurring = record.recurrence_rule.is_some(),
            "Template created"
        );
        Ok(record)
    }

    /// ## Summary
    /// Replaces the content of the occurrence on `occurrence_date`.
    ///
    /// Any earlier override or deletion marker for that date is replaced, so
    /// editing a deleted occurrence restores it. Returns the edited instance.
    ///
    /// ## Errors
    /// Returns `ServiceError::TemplateNotFound`, `ServiceError::NotRecurring`,
    /// `ServiceError::InstanceNotFound` if the rule has no occurrence on that
    /// date, or a store error.
    #[tracing::instrument(skip(self, store, overrides), fields(override_keys = overrides.len()))]
    pub async fn update_instance<S: RecurrenceStore>(
        &self,
        store: &mut S,
        template_id: uuid::Uuid,
        occurrence_date: NaiveDate,
        overrides: Payload,
    ) -> ServiceResult<VirtualInstance> {
        let template = lock_recurring(store, template_id).await?;
        let start = require_occurrence(&template, occurrence_date)?;

        let exception = ExceptionRecord::modified(occurrence_date, overrides);
        store
            .upsert_exception(template.id, template.owner_id, &exception)
            .await?;

        tracing::debug!("Occurrence modified");
        Ok(template.instance(start, Some(&exception.overrides)))
    }

    /// ## Summary
    /// Hides the occurrence on `occurrence_date`, then retires the template
    /// if that was the last visible occurrence of a bounded series.
    ///
    /// ## Errors
    /// Returns `ServiceError::TemplateNotFound`, `ServiceError::NotRecurring`,
    /// `ServiceError::InstanceNotFound` if the rule has no occurrence on that
    /// date, or a store error.
    #[tracing::instrument(skip(self, store))]
    pub async fn delete_instance<S: RecurrenceStore>(
        &self,
        store: &mut S,
        template_id: uuid::Uuid,
        occurrence_date: NaiveDate,
    ) -> ServiceResult<DeleteOutcome> {
        let template = lock_recurring(store, template_id).await?;
        require_occurrence(&template, occurrence_date)?;

        store
            .upsert_exception(
                template.id,
                template.owner_id,
                &ExceptionRecord::deleted(occurrence_date),
            )
            .await?;
        tracing::debug!("Occurrence deleted");

        if self.retire_if_exhausted(store, &template).await? {
            Ok(DeleteOutcome::TemplateRetired)
        } else {
            Ok(DeleteOutcome::InstanceDeleted)
        }
    }

    /// ## Summary
    /// Deletes `template` and all of its exceptions if every occurrence of its
    /// bounded series carries a deletion marker. Returns whether it did.
    ///
    /// Unbounded rules are never retired. Neither are series longer than the
    /// configured scan limit, nor series with no occurrences at all. Running
    /// the check again after it succeeded or failed is harmless.
    ///
    /// ## Errors
    /// Returns a store error if reading exceptions or deleting fails.
    #[tracing::instrument(skip(self, store, template), fields(template_id = %template.id))]
    pub async fn retire_if_exhausted<S: RecurrenceStore>(
        &self,
        store: &mut S,
        template: &RecurringTemplate,
    ) -> ServiceResult<bool> {
        if !template.rule.is_bounded() {
            tracing::trace!("Unbounded rule; never exhausted");
            return Ok(false);
        }

        let limit = self.config.exhaustion_scan_limit;
        let series: Vec<DateTime<Utc>> = template
            .series()
            .take(limit.saturating_add(1))
            .collect();
        if series.len() > limit {
            tracing::warn!(limit, "Bounded series exceeds exhaustion scan limit; not retiring");
            return Ok(false);
        }
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            tracing::debug!("Series has no occurrences; not retiring");
            return Ok(false);
        };

        let deleted: HashSet<NaiveDate> = store
            .fetch_exceptions(
                template.id,
                template.owner_id,
                Some((first.date_naive(), last.date_naive())),
            )
            .await?
            .into_iter()
            .filter(|exception| exception.is_deleted)
            .map(|exception| exception.occurrence_date)
            .collect();

        let remaining = series
            .iter()
            .filter(|start| !deleted.contains(&start.date_naive()))
            .count();
        if remaining > 0 {
            tracing::trace!(remaining, "Series still has visible occurrences");
            return Ok(false);
        }

        let removed = store.delete_all_exceptions(template.id).await?;
        store.delete_template(template.id).await?;
        tracing::info!(
            occurrences = series.len(),
            exceptions_removed = removed,
            "Exhausted template retired"
        );
        Ok(true)
    }
}

/// Loads the template for a mutation, holding it until the store's unit of
/// work ends so the exhaustion check sees every committed exception.
async fn lock_recurring<S: RecurrenceStore>(
    store: &mut S,
    template_id: uuid::Uuid,
) -> ServiceResult<RecurringTemplate> {
    let record = store
        .lock_template(template_id)
        .await?
        .ok_or(ServiceError::TemplateNotFound(template_id))?;
    RecurringTemplate::from_record(record)
}

fn require_occurrence(
    template: &RecurringTemplate,
    occurrence_date: NaiveDate,
) -> ServiceResult<DateTime<Utc>> {
    template
        .occurrence_on(occurrence_date)
        .ok_or(ServiceError::InstanceNotFound {
            template_id: template.id,
            occurrence_date,
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::store::memory::{MemoryStore, MemoryTransaction};

    /// Records which template reads a unit of work issued.
    struct RecordingStore {
        inner: MemoryTransaction,
        locked: Vec<uuid::Uuid>,
        plain_loads: usize,
    }

    impl RecurrenceStore for RecordingStore {
        async fn load_template(
            &mut self,
            template_id: uuid::Uuid,
        ) -> ServiceResult<Option<TemplateRecord>> {
            self.plain_loads += 1;
            self.inner.load_template(template_id).await
        }

        async fn lock_template(
            &mut self,
            template_id: uuid::Uuid,
        ) -> ServiceResult<Option<TemplateRecord>> {
            self.locked.push(template_id);
            self.inner.lock_template(template_id).await
        }

        async fn insert_template(&mut self, record: &TemplateRecord) -> ServiceResult<()> {
            self.inner.insert_template(record).await
        }

        async fn fetch_exceptions(
            &mut self,
            template_id: uuid::Uuid,
            owner_id: uuid::Uuid,
            range: Option<(NaiveDate, NaiveDate)>,
        ) -> ServiceResult<Vec<ExceptionRecord>> {
            self.inner.fetch_exceptions(template_id, owner_id, range).await
        }

        async fn upsert_exception(
            &mut self,
            template_id: uuid::Uuid,
            owner_id: uuid::Uuid,
            exception: &ExceptionRecord,
        ) -> ServiceResult<()> {
            self.inner.upsert_exception(template_id, owner_id, exception).await
        }

        async fn delete_all_exceptions(&mut self, template_id: uuid::Uuid) -> ServiceResult<usize> {
            self.inner.delete_all_exceptions(template_id).await
        }

        async fn delete_template(&mut self, template_id: uuid::Uuid) -> ServiceResult<bool> {
            self.inner.delete_template(template_id).await
        }
    }

    #[test_log::test(tokio::test)]
    async fn mutations_lock_the_template_before_reading_it() {
        let store = MemoryStore::new();
        let manager = RecurrenceLifecycleManager::new(RecurrenceConfig::default());
        let mut recording = RecordingStore {
            inner: store.begin().await,
            locked: Vec::new(),
            plain_loads: 0,
        };

        let record = manager
            .create_template(
                &mut recording,
                NewTemplate {
                    owner_id: uuid::Uuid::new_v4(),
                    anchor_start: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
                    duration: TimeDelta::hours(1),
                    recurrence_rule: Some("FREQ=DAILY;COUNT=2".to_string()),
                    until: None,
                    details: Payload::new(),
                },
            )
            .await
            .unwrap();
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let second = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        manager
            .update_instance(&mut recording, record.id, first, Payload::new())
            .await
            .unwrap();
        let outcome = manager
            .delete_instance(&mut recording, record.id, second)
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::InstanceDeleted);
        assert_eq!(recording.locked, vec![record.id, record.id]);
        assert_eq!(recording.plain_loads, 0);
    }

    #[test]
    fn delete_outcome_display() {
        assert_eq!(DeleteOutcome::InstanceDeleted.to_string(), "instance-deleted");
        assert_eq!(DeleteOutcome::TemplateRetired.to_string(), "template-retired");
    }
}
