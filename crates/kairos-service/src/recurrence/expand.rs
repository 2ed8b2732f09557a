//! Window expansion: enumerated candidates overlaid with stored exceptions.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use kairos_core::config::RecurrenceConfig;
use kairos_core::types::DateRange;

use crate::error::{ServiceError, ServiceResult};
use crate::recurrence::template::{RecurringTemplate, VirtualInstance};
use crate::store::{ExceptionRecord, RecurrenceStore};

/// Produces the virtual instances of a template for a query window.
#[derive(Debug, Clone, Copy)]
pub struct OccurrenceExpander {
    max_instances: usize,
}

impl OccurrenceExpander {
    #[must_use]
    pub const fn new(config: &RecurrenceConfig) -> Self {
        Self {
            max_instances: config.max_instances,
        }
    }

    /// ## Summary
    /// Expands `template` over `window` (both ends inclusive).
    ///
    /// Exceptions for the window's dates are loaded with a single fetch and
    /// matched to candidates by UTC date. Deleted occurrences are omitted;
    /// modified ones keep their nominal time slot and take the override payload.
    ///
    /// The configured maximum (`recurrence.max_instances`, 1000 by default) is a
    /// limit callers see: a dense rule over a long window, such as three days a
    /// week for seven years, exceeds it. Such callers split the range into
    /// smaller windows or raise the setting.
    ///
    /// ## Errors
    /// Returns `ServiceError::TooManyOccurrences` if the window holds more
    /// candidates than the configured maximum, or a store error if the
    /// exception fetch fails.
    #[tracing::instrument(
        skip(self, store, template, window),
        fields(template_id = %template.id, window = %window)
    )]
    pub async fn expand<S: RecurrenceStore>(
        &self,
        store: &mut S,
        template: &RecurringTemplate,
        window: DateRange,
    ) -> ServiceResult<Vec<VirtualInstance>> {
        let candidates: Vec<DateTime<Utc>> = template
            .occurrences(window)
            .take(self.max_instances.saturating_add(1))
            .collect();
        if candidates.len() > self.max_instances {
            tracing::warn!(limit = self.max_instances, "Expansion window too large");
            return Err(ServiceError::TooManyOccurrences {
                limit: self.max_instances,
                window,
            });
        }
        if candidates.is_empty() {
            tracing::debug!("No candidates in window");
            return Ok(Vec::new());
        }

        let exceptions = store
            .fetch_exceptions(template.id, template.owner_id, Some(window.date_span()))
            .await?;
        tracing::debug!(
            candidates = candidates.len(),
            exceptions = exceptions.len(),
            "Merging exceptions into candidates"
        );

        Ok(overlay(template, candidates, exceptions))
    }

    /// ## Summary
    /// Loads a template by ID and expands it over `window`.
    ///
    /// ## Errors
    /// Returns `ServiceError::TemplateNotFound` if the template does not exist,
    /// `ServiceError::NotRecurring` if it has no rule, or any error from
    /// [`OccurrenceExpander::expand`].
    pub async fn expand_by_id<S: RecurrenceStore>(
        &self,
        store: &mut S,
        template_id: uuid::Uuid,
        window: DateRange,
    ) -> ServiceResult<Vec<VirtualInstance>> {
        let record = store
            .load_template(template_id)
            .await?
            .ok_or(ServiceError::TemplateNotFound(template_id))?;
        let template = RecurringTemplate::from_record(record)?;
        self.expand(store, &template, window).await
    }
}

/// ## Summary
/// Applies exceptions to candidate start times, preserving candidate order.
///
/// Each candidate is matched to at most one exception by its UTC date.
/// Exceptions whose date matches no candidate are ignored.
#[must_use]
pub fn overlay(
    template: &RecurringTemplate,
    candidates: impl IntoIterator<Item = DateTime<Utc>>,
    exceptions: Vec<ExceptionRecord>,
) -> Vec<VirtualInstance> {
    let by_date: HashMap<NaiveDate, ExceptionRecord> = exceptions
        .into_iter()
        .map(|exception| (exception.occurrence_date, exception))
        .collect();

    candidates
        .into_iter()
        .filter_map(|start| match by_date.get(&start.date_naive()) {
            None => Some(template.instance(start, None)),
            Some(exception) if exception.is_deleted => {
                tracing::trace!(occurrence = %start, "Occurrence deleted");
                None
            }
            Some(exception) => Some(template.instance(start, Some(&exception.overrides))),
        })
        .collect()
}
