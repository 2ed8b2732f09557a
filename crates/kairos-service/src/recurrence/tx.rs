//! Entry points that run one engine operation inside one database transaction.
//!
//! The exception write, the exhaustion check, and a resulting retirement all
//! commit together or not at all. Mutations lock the template row first, so
//! concurrent mutations of one template run one after another.

use chrono::NaiveDate;
use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use kairos_core::config::RecurrenceConfig;
use kairos_core::types::DateRange;
use kairos_db::db::DbProvider;

use crate::error::{ServiceError, ServiceResult};
use crate::recurrence::expand::OccurrenceExpander;
use crate::recurrence::lifecycle::{DeleteOutcome, NewTemplate, RecurrenceLifecycleManager};
use crate::recurrence::template::VirtualInstance;
use crate::store::postgres::PgRecurrenceStore;
use crate::store::{Payload, TemplateRecord};

/// ## Summary
/// Validates and stores a new template in its own transaction.
///
/// ## Errors
/// Returns `ServiceError::RuleError` for invalid rule text, or a database error.
#[tracing::instrument(skip(provider, config, new))]
pub async fn create_template<P: DbProvider>(
    provider: &P,
    config: RecurrenceConfig,
    new: NewTemplate,
) -> ServiceResult<TemplateRecord> {
    let mut conn = provider.get_connection().await?;
    conn.transaction::<_, ServiceError, _>(move |tx| {
        async move {
            let mut store = PgRecurrenceStore::new(tx);
            RecurrenceLifecycleManager::new(config)
                .create_template(&mut store, new)
                .await
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Edits one occurrence in its own transaction.
///
/// ## Errors
/// See [`RecurrenceLifecycleManager::update_instance`].
#[tracing::instrument(skip(provider, config, overrides))]
pub async fn update_instance<P: DbProvider>(
    provider: &P,
    config: RecurrenceConfig,
    template_id: uuid::Uuid,
    occurrence_date: NaiveDate,
    overrides: Payload,
) -> ServiceResult<VirtualInstance> {
    let mut conn = provider.get_connection().await?;
    conn.transaction::<_, ServiceError, _>(move |tx| {
        async move {
            let mut store = PgRecurrenceStore::new(tx);
            RecurrenceLifecycleManager::new(config)
                .update_instance(&mut store, template_id, occurrence_date, overrides)
                .await
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Deletes one occurrence, retiring the template if it became exhausted, in
/// a single transaction.
///
/// ## Errors
/// See [`RecurrenceLifecycleManager::delete_instance`].
#[tracing::instrument(skip(provider, config))]
pub async fn delete_instance<P: DbProvider>(
    provider: &P,
    config: RecurrenceConfig,
    template_id: uuid::Uuid,
    occurrence_date: NaiveDate,
) -> ServiceResult<DeleteOutcome> {
    let mut conn = provider.get_connection().await?;
    conn.transaction::<_, ServiceError, _>(move |tx| {
        async move {
            let mut store = PgRecurrenceStore::new(tx);
            RecurrenceLifecycleManager::new(config)
                .delete_instance(&mut store, template_id, occurrence_date)
                .await
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Expands a template over `window` against one consistent snapshot.
///
/// ## Errors
/// See [`OccurrenceExpander::expand_by_id`].
#[tracing::instrument(skip(provider, config, window), fields(window = %window))]
pub async fn expand_template<P: DbProvider>(
    provider: &P,
    config: RecurrenceConfig,
    template_id: uuid::Uuid,
    window: DateRange,
) -> ServiceResult<Vec<VirtualInstance>> {
    let mut conn = provider.get_connection().await?;
    conn.transaction::<_, ServiceError, _>(move |tx| {
        async move {
            let mut store = PgRecurrenceStore::new(tx);
            OccurrenceExpander::new(&config)
                .expand_by_id(&mut store, template_id, window)
                .await
        }
        .scope_boxed()
    })
    .await
}
