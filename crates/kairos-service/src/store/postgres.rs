//! PostgreSQL-backed store over a borrowed connection.

use chrono::{NaiveDate, TimeDelta};
use kairos_db::db::connection::DbConnection;
use kairos_db::db::query::{exception, template};
use kairos_db::model::exception::{NewScheduleException, ScheduleException};
use kairos_db::model::template::{NewScheduleTemplate, ScheduleTemplate};
use serde_json::Value as JsonValue;

use crate::error::{ServiceError, ServiceResult};
use crate::store::{ExceptionRecord, Payload, RecurrenceStore, TemplateRecord};

/// Store issuing queries on one connection.
///
/// Atomicity comes from the caller: construct it inside a diesel transaction
/// (see [`crate::recurrence::tx`]) so that every read and write made through
/// it commits or rolls back together.
pub struct PgRecurrenceStore<'c, 'p> {
    conn: &'c mut DbConnection<'p>,
}

impl<'c, 'p> PgRecurrenceStore<'c, 'p> {
    #[must_use]
    pub fn new(conn: &'c mut DbConnection<'p>) -> Self {
        Self { conn }
    }
}

fn into_payload(value: JsonValue, column: &'static str) -> ServiceResult<Payload> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(ServiceError::ValidationError(format!(
            "{column} must be a JSON object, found {other}"
        ))),
    }
}

fn template_from_row(row: ScheduleTemplate) -> ServiceResult<TemplateRecord> {
    let duration = TimeDelta::try_seconds(row.duration_seconds).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "duration_seconds out of range: {}",
            row.duration_seconds
        ))
    })?;
    Ok(TemplateRecord {
        id: row.id,
        owner_id: row.owner_id,
        anchor_start: row.anchor_start,
        duration,
        recurrence_rule: row.recurrence_rule,
        until: row.until,
        details: into_payload(row.details, "details")?,
    })
}

fn exception_from_row(row: ScheduleException) -> ServiceResult<ExceptionRecord> {
    Ok(ExceptionRecord {
        occurrence_date: row.occurrence_date,
        is_deleted: row.is_deleted,
        overrides: into_payload(row.overrides, "overrides")?,
    })
}

impl RecurrenceStore for PgRecurrenceStore<'_, '_> {
    async fn load_template(
        &mut self,
        template_id: uuid::Uuid,
    ) -> ServiceResult<Option<TemplateRecord>> {
        template::get_template(self.conn, template_id)
            .await?
            .map(template_from_row)
            .transpose()
    }

    async fn lock_template(
        &mut self,
        template_id: uuid::Uuid,
    ) -> ServiceResult<Option<TemplateRecord>> {
        template::get_template_for_update(self.conn, template_id)
            .await?
            .map(template_from_row)
            .transpose()
    }

    async fn insert_template(&mut self, record: &TemplateRecord) -> ServiceResult<()> {
        let details = JsonValue::Object(record.details.clone());
        let new_template = NewScheduleTemplate {
            id: record.id,
            owner_id: record.owner_id,
            anchor_start: record.anchor_start,
            duration_seconds: record.duration.num_seconds(),
            recurrence_rule: record.recurrence_rule.as_deref(),
            until: record.until,
            details: &details,
        };
        template::create_template(self.conn, &new_template).await?;
        Ok(())
    }

    async fn fetch_exceptions(
        &mut self,
        template_id: uuid::Uuid,
        owner_id: uuid::Uuid,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> ServiceResult<Vec<ExceptionRecord>> {
        exception::fetch_exceptions(self.conn, template_id, owner_id, range)
            .await?
            .into_iter()
            .map(exception_from_row)
            .collect()
    }

    async fn upsert_exception(
        &mut self,
        template_id: uuid::Uuid,
        owner_id: uuid::Uuid,
        record: &ExceptionRecord,
    ) -> ServiceResult<()> {
        let overrides = JsonValue::Object(record.overrides.clone());
        let new_exception = NewScheduleException {
            id: uuid::Uuid::now_v7(),
            template_id,
            owner_id,
            occurrence_date: record.occurrence_date,
            is_deleted: record.is_deleted,
            overrides: &overrides,
        };
        exception::upsert_exception(self.conn, &new_exception).await?;
        Ok(())
    }

    async fn delete_all_exceptions(&mut self, template_id: uuid::Uuid) -> ServiceResult<usize> {
        Ok(exception::delete_all_exceptions(self.conn, template_id).await?)
    }

    async fn delete_template(&mut self, template_id: uuid::Uuid) -> ServiceResult<bool> {
        Ok(template::delete_template(self.conn, template_id).await? > 0)
    }
}
