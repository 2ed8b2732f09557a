//! Persistence seam between the engine and its template/exception storage.
//!
//! Every method takes `&mut self`: a store value represents one unit of work
//! (a database transaction or a locked in-memory snapshot), and the engine's
//! read-modify-write sequences run against a single such value.

pub mod memory;
pub mod postgres;

use std::future::Future;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::error::ServiceResult;

/// Template details and exception overrides: a JSON object whose keys are the
/// editable fields (title, description, tags, ...). Opaque to the engine.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A stored schedule definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRecord {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub anchor_start: DateTime<Utc>,
    pub duration: TimeDelta,
    /// `None` for a one-off schedule.
    pub recurrence_rule: Option<String>,
    pub until: Option<DateTime<Utc>>,
    pub details: Payload,
}

/// A stored override or deletion marker for the occurrence on `occurrence_date`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionRecord {
    pub occurrence_date: NaiveDate,
    pub is_deleted: bool,
    pub overrides: Payload,
}

impl ExceptionRecord {
    /// Marker hiding the occurrence on `occurrence_date`.
    #[must_use]
    pub fn deleted(occurrence_date: NaiveDate) -> Self {
        Self {
            occurrence_date,
            is_deleted: true,
            overrides: Payload::new(),
        }
    }

    /// Override replacing the content of the occurrence on `occurrence_date`.
    #[must_use]
    pub fn modified(occurrence_date: NaiveDate, overrides: Payload) -> Self {
        Self {
            occurrence_date,
            is_deleted: false,
            overrides,
        }
    }
}

/// Storage operations the recurrence engine depends on.
pub trait RecurrenceStore: Send {
    /// ## Summary
    /// Loads a template, or `None` if it does not exist.
    ///
    /// ## Errors
    /// Returns an error if the underlying storage fails.
    fn load_template(
        &mut self,
        template_id: uuid::Uuid,
    ) -> impl Future<Output = ServiceResult<Option<TemplateRecord>>> + Send;

    /// ## Summary
    /// Loads a template and holds it exclusively until the unit of work ends,
    /// or returns `None` if it does not exist.
    ///
    /// Every read-modify-write sequence on one template starts here, so two
    /// units of work mutating the same template never interleave.
    ///
    /// ## Errors
    /// Returns an error if the underlying storage fails.
    fn lock_template(
        &mut self,
        template_id: uuid::Uuid,
    ) -> impl Future<Output = ServiceResult<Option<TemplateRecord>>> + Send;

    /// ## Summary
    /// Stores a new template.
    ///
    /// ## Errors
    /// Returns an error if a template with the same ID exists or the write fails.
    fn insert_template(
        &mut self,
        record: &TemplateRecord,
    ) -> impl Future<Output = ServiceResult<()>> + Send;

    /// ## Summary
    /// Fetches a template's exceptions for `owner_id` in one read, ordered by
    /// date, optionally restricted to an inclusive date range.
    ///
    /// ## Errors
    /// Returns an error if the underlying storage fails.
    fn fetch_exceptions(
        &mut self,
        template_id: uuid::Uuid,
        owner_id: uuid::Uuid,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> impl Future<Output = ServiceResult<Vec<ExceptionRecord>>> + Send;

    /// ## Summary
    /// Creates or replaces the single exception keyed by
    /// `(template_id, exception.occurrence_date, owner_id)`.
    ///
    /// ## Errors
    /// Returns an error if the write fails.
    fn upsert_exception(
        &mut self,
        template_id: uuid::Uuid,
        owner_id: uuid::Uuid,
        exception: &ExceptionRecord,
    ) -> impl Future<Output = ServiceResult<()>> + Send;

    /// ## Summary
    /// Removes every exception of a template, returning how many were removed.
    ///
    /// ## Errors
    /// Returns an error if the write fails.
    fn delete_all_exceptions(
        &mut self,
        template_id: uuid::Uuid,
    ) -> impl Future<Output = ServiceResult<usize>> + Send;

    /// ## Summary
    /// Removes a template, returning whether it existed.
    ///
    /// ## Errors
    /// Returns an error if the write fails.
    fn delete_template(
        &mut self,
        template_id: uuid::Uuid,
    ) -> impl Future<Output = ServiceResult<bool>> + Send;
}
