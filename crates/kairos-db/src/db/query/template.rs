//! Query functions for schedule templates.

use diesel::dsl::{AsSelect, Find, ForUpdate, Select};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::schedule_template;
use crate::model::template::{NewScheduleTemplate, ScheduleTemplate};

type BoxedQuery<'a> = schedule_template::BoxedQuery<'a, Pg, AsSelect<ScheduleTemplate, Pg>>;
type LockingQuery =
    ForUpdate<Select<Find<schedule_template::table, uuid::Uuid>, AsSelect<ScheduleTemplate, Pg>>>;

/// ## Summary
/// Returns a query to select all templates.
#[must_use]
pub fn all() -> BoxedQuery<'static> {
    schedule_template::table
        .select(ScheduleTemplate::as_select())
        .into_boxed()
}

/// ## Summary
/// Returns a query to find a template by ID.
#[must_use]
pub fn by_id(id: uuid::Uuid) -> BoxedQuery<'static> {
    all().filter(schedule_template::id.eq(id))
}

/// ## Summary
/// Returns a row-locking query (`FOR UPDATE`) for a template by ID.
#[must_use]
pub fn by_id_for_update(id: uuid::Uuid) -> LockingQuery {
    schedule_template::table
        .find(id)
        .select(ScheduleTemplate::as_select())
        .for_update()
}

/// ## Summary
/// Inserts a new template and returns the inserted record.
///
/// ## Errors
/// Returns a database error if the insert fails.
#[tracing::instrument(skip(conn, new_template), fields(template_id = %new_template.id))]
pub async fn create_template(
    conn: &mut DbConnection<'_>,
    new_template: &NewScheduleTemplate<'_>,
) -> diesel::QueryResult<ScheduleTemplate> {
    diesel::insert_into(schedule_template::table)
        .values(new_template)
        .returning(ScheduleTemplate::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Loads a template by ID, or `None` if it does not exist.
///
/// ## Errors
/// Returns a database error if the query fails.
#[tracing::instrument(skip(conn))]
pub async fn get_template(
    conn: &mut DbConnection<'_>,
    template_id: uuid::Uuid,
) -> diesel::QueryResult<Option<ScheduleTemplate>> {
    by_id(template_id).first(conn).await.optional()
}

/// ## Summary
/// Loads a template by ID and locks its row until the surrounding transaction
/// ends, or returns `None` if it does not exist.
///
/// A concurrent locking load of the same template waits for the lock, then
/// sees the row as committed by the holder (or `None` if it was deleted).
///
/// ## Errors
/// Returns a database error if the query fails.
#[tracing::instrument(skip(conn))]
pub async fn get_template_for_update(
    conn: &mut DbConnection<'_>,
    template_id: uuid::Uuid,
) -> diesel::QueryResult<Option<ScheduleTemplate>> {
    by_id_for_update(template_id)
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Deletes a template. Its exceptions are removed by the foreign key cascade.
///
/// Returns the number of deleted rows (0 or 1).
///
/// ## Errors
/// Returns a database error if the delete fails.
#[tracing::instrument(skip(conn))]
pub async fn delete_template(
    conn: &mut DbConnection<'_>,
    template_id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::delete(schedule_template::table.filter(schedule_template::id.eq(template_id)))
        .execute(conn)
        .await
}
