//! Query functions for schedule exceptions.

use chrono::NaiveDate;
use diesel::dsl::AsSelect;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::schedule_exception;
use crate::model::exception::{NewScheduleException, ScheduleException};

type BoxedQuery<'a> = schedule_exception::BoxedQuery<'a, Pg, AsSelect<ScheduleException, Pg>>;

/// ## Summary
/// Returns a query for every exception of a template owned by `owner_id`,
/// ordered by occurrence date.
#[must_use]
pub fn for_template(
    template_id: uuid::Uuid,
    owner_id: uuid::Uuid,
) -> BoxedQuery<'static> {
    schedule_exception::table
        .select(ScheduleException::as_select())
        .filter(schedule_exception::template_id.eq(template_id))
        .filter(schedule_exception::owner_id.eq(owner_id))
        .order(schedule_exception::occurrence_date.asc())
        .into_boxed()
}

/// ## Summary
/// Returns a query for a template's exceptions whose occurrence date lies in
/// `first..=last`.
#[must_use]
pub fn in_date_range(
    template_id: uuid::Uuid,
    owner_id: uuid::Uuid,
    first: NaiveDate,
    last: NaiveDate,
) -> BoxedQuery<'static> {
    for_template(template_id, owner_id)
        .filter(schedule_exception::occurrence_date.between(first, last))
}

/// ## Summary
/// Fetches a template's exceptions in one query, optionally restricted to an
/// inclusive date range.
///
/// ## Errors
/// Returns a database error if the query fails.
#[tracing::instrument(skip(conn))]
pub async fn fetch_exceptions(
    conn: &mut DbConnection<'_>,
    template_id: uuid::Uuid,
    owner_id: uuid::Uuid,
    range: Option<(NaiveDate, NaiveDate)>,
) -> diesel::QueryResult<Vec<ScheduleException>> {
    let query = match range {
        Some((first, last)) => in_date_range(template_id, owner_id, first, last),
        None => for_template(template_id, owner_id),
    };
    query.load(conn).await
}

/// ## Summary
/// Inserts an exception, or replaces the deletion flag and overrides of the
/// existing record for the same `(template_id, occurrence_date, owner_id)`.
///
/// ## Errors
/// Returns a database error if the upsert fails.
#[tracing::instrument(
    skip(conn, new_exception),
    fields(
        template_id = %new_exception.template_id,
        occurrence_date = %new_exception.occurrence_date,
        is_deleted = new_exception.is_deleted,
    )
)]
pub async fn upsert_exception(
    conn: &mut DbConnection<'_>,
    new_exception: &NewScheduleException<'_>,
) -> diesel::QueryResult<ScheduleException> {
    diesel::insert_into(schedule_exception::table)
        .values(new_exception)
        .on_conflict((
            schedule_exception::template_id,
            schedule_exception::occurrence_date,
            schedule_exception::owner_id,
        ))
        .do_update()
        .set((
            schedule_exception::is_deleted.eq(excluded(schedule_exception::is_deleted)),
            schedule_exception::overrides.eq(excluded(schedule_exception::overrides)),
            schedule_exception::updated_at.eq(diesel::dsl::now),
        ))
        .returning(ScheduleException::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Deletes every exception of a template, returning how many were removed.
///
/// ## Errors
/// Returns a database error if the delete fails.
#[tracing::instrument(skip(conn))]
pub async fn delete_all_exceptions(
    conn: &mut DbConnection<'_>,
    template_id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::delete(
        schedule_exception::table.filter(schedule_exception::template_id.eq(template_id)),
    )
    .execute(conn)
    .await
}
