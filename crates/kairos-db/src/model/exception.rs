//! Models for the `schedule_exception` table.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::{pg::Pg, prelude::*};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::db::schema::schedule_exception;

/// Per-date override or deletion marker for one occurrence of a template.
///
/// Unique per `(template_id, occurrence_date, owner_id)`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schedule_exception)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(super::template::ScheduleTemplate, foreign_key = template_id))]
pub struct ScheduleException {
    pub id: Uuid,
    pub template_id: Uuid,
    pub owner_id: Uuid,
    /// UTC date of the occurrence this record applies to.
    pub occurrence_date: NaiveDate,
    pub is_deleted: bool,
    /// Fields replacing the template's details; empty for deletions.
    pub overrides: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert struct for creating or replacing an exception
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schedule_exception)]
pub struct NewScheduleException<'a> {
    pub id: Uuid,
    pub template_id: Uuid,
    pub owner_id: Uuid,
    pub occurrence_date: NaiveDate,
    pub is_deleted: bool,
    pub overrides: &'a JsonValue,
}
