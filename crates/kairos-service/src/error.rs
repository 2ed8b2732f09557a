use chrono::NaiveDate;
use kairos_core::types::DateRange;
use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    RuleError(#[from] kairos_rrule::RuleError),

    #[error(transparent)]
    DatabaseError(#[from] kairos_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] kairos_core::error::CoreError),

    #[error("Diesel error: {0}")]
    DieselError(#[from] diesel::result::Error),

    #[error("Template not found: {0}")]
    TemplateNotFound(uuid::Uuid),

    #[error("Template {0} has no recurrence rule")]
    NotRecurring(uuid::Uuid),

    #[error("Template {template_id} has no occurrence on {occurrence_date}")]
    InstanceNotFound {
        template_id: uuid::Uuid,
        occurrence_date: NaiveDate,
    },

    /// The window holds more candidates than `recurrence.max_instances`.
    /// Callers page through long ranges with smaller windows or raise the limit.
    #[error("Window {window} holds more than {limit} occurrences")]
    TooManyOccurrences { limit: usize, window: DateRange },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
