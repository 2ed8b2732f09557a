//! In-memory store with transactional semantics, for tests and embedding.
//!
//! A [`MemoryTransaction`] holds the store's lock for its whole lifetime and
//! works on a private copy of the whole state. [`MemoryTransaction::commit`]
//! publishes the copy; dropping the transaction without committing discards it.
//!
//! Beginning a transaction clones every template and exception, and
//! transactions run one at a time. That suits test suites and small embedded
//! data sets; production deployments use the PostgreSQL store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{ExceptionRecord, RecurrenceStore, TemplateRecord};

/// Exceptions keyed by `(template_id, owner_id, occurrence_date)`.
type ExceptionKey = (uuid::Uuid, uuid::Uuid, NaiveDate);

#[derive(Debug, Clone, Default)]
struct MemoryState {
    templates: HashMap<uuid::Uuid, TemplateRecord>,
    exceptions: BTreeMap<ExceptionKey, ExceptionRecord>,
}

/// Shared in-memory template and exception storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Starts a transaction, waiting for any transaction already in progress.
    ///
    /// Copies the full committed state, so the cost grows with the store size.
    pub async fn begin(&self) -> MemoryTransaction {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        MemoryTransaction { guard, staged }
    }

    /// Returns the committed template with `template_id`, if any.
    pub async fn template(&self, template_id: uuid::Uuid) -> Option<TemplateRecord> {
        self.state.lock().await.templates.get(&template_id).cloned()
    }

    /// Number of committed templates.
    pub async fn template_count(&self) -> usize {
        self.state.lock().await.templates.len()
    }

    /// Returns every committed exception of a template, across owners.
    pub async fn exceptions(&self, template_id: uuid::Uuid) -> Vec<ExceptionRecord> {
        self.state
            .lock()
            .await
            .exceptions
            .iter()
            .filter(|((id, _, _), _)| *id == template_id)
            .map(|(_, exception)| exception.clone())
            .collect()
    }
}

/// Exclusive unit of work over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

impl MemoryTransaction {
    /// Publishes every write made through this transaction.
    pub fn commit(self) {
        let Self { mut guard, staged } = self;
        *guard = staged;
        tracing::trace!("Memory transaction committed");
    }
}

impl RecurrenceStore for MemoryTransaction {
    async fn load_template(
        &mut self,
        template_id: uuid::Uuid,
    ) -> ServiceResult<Option<TemplateRecord>> {
        Ok(self.staged.templates.get(&template_id).cloned())
    }

    async fn lock_template(
        &mut self,
        template_id: uuid::Uuid,
    ) -> ServiceResult<Option<TemplateRecord>> {
        // The transaction already holds the store lock.
        self.load_template(template_id).await
    }

    async fn insert_template(&mut self, record: &TemplateRecord) -> ServiceResult<()> {
        if self.staged.templates.contains_key(&record.id) {
            return Err(ServiceError::ValidationError(format!(
                "template {} already exists",
                record.id
            )));
        }
        self.staged.templates.insert(record.id, record.clone());
        Ok(())
    }

    async fn fetch_exceptions(
        &mut self,
        template_id: uuid::Uuid,
        owner_id: uuid::Uuid,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> ServiceResult<Vec<ExceptionRecord>> {
        let (first, last) = range.unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        if first > last {
            return Ok(Vec::new());
        }
        Ok(self
            .staged
            .exceptions
            .range((template_id, owner_id, first)..=(template_id, owner_id, last))
            .map(|(_, exception)| exception.clone())
            .collect())
    }

    async fn upsert_exception(
        &mut self,
        template_id: uuid::Uuid,
        owner_id: uuid::Uuid,
        exception: &ExceptionRecord,
    ) -> ServiceResult<()> {
        if !self.staged.templates.contains_key(&template_id) {
            return Err(ServiceError::TemplateNotFound(template_id));
        }
        self.staged.exceptions.insert(
            (template_id, owner_id, exception.occurrence_date),
            exception.clone(),
        );
        Ok(())
    }

    async fn delete_all_exceptions(&mut self, template_id: uuid::Uuid) -> ServiceResult<usize> {
        let before = self.staged.exceptions.len();
        self.staged
            .exceptions
            .retain(|(id, _, _), _| *id != template_id);
        Ok(before - self.staged.exceptions.len())
    }

    async fn delete_template(&mut self, template_id: uuid::Uuid) -> ServiceResult<bool> {
        let existed = self.staged.templates.remove(&template_id).is_some();
        // Mirrors the foreign key cascade of the relational schema.
        self.staged
            .exceptions
            .retain(|(id, _, _), _| *id != template_id);
        Ok(existed)
    }
}
