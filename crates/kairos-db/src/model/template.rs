//! Models for the `schedule_template` table.

use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::db::schema::schedule_template;

/// Stored definition of a schedule, recurring or not.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schedule_template)]
#[diesel(check_for_backend(Pg))]
pub struct ScheduleTemplate {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Start of the first nominal occurrence.
    pub anchor_start: DateTime<Utc>,
    /// Constant length of every occurrence.
    pub duration_seconds: i64,
    /// Recurrence rule text; `None` for a one-off schedule.
    pub recurrence_rule: Option<String>,
    /// Record-level end of the series, independent of any `UNTIL` in the rule.
    pub until: Option<DateTime<Utc>>,
    /// Editable content (title, description, tags, ...), always a JSON object.
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert struct for creating new templates
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schedule_template)]
pub struct NewScheduleTemplate<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub anchor_start: DateTime<Utc>,
    pub duration_seconds: i64,
    pub recurrence_rule: Option<&'a str>,
    pub until: Option<DateTime<Utc>>,
    pub details: &'a JsonValue,
}
