pub mod expand;
pub mod lifecycle;
pub mod template;
pub mod tx;

pub use expand::{OccurrenceExpander, overlay};
pub use lifecycle::{DeleteOutcome, NewTemplate, RecurrenceLifecycleManager};
pub use template::{RecurringTemplate, VirtualInstance};
