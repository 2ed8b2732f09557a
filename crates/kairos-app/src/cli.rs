//! Command-line interface of the operator binary.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use kairos_service::recurrence::VirtualInstance;
use kairos_service::store::Payload;

#[derive(Debug, Parser)]
#[command(name = "kairos", version)]
#[command(about = "Expand and edit recurring schedules stored in PostgreSQL")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Apply pending database migrations and exit
    Migrate,
    /// Print every instance of a template between two UTC dates, one JSON object per line
    Expand {
        template_id: uuid::Uuid,

        /// First day of the window (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        first: NaiveDate,

        /// Last day of the window, inclusive (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        last: NaiveDate,
    },
    /// Replace the content of one occurrence, restoring it if it was deleted
    UpdateInstance {
        template_id: uuid::Uuid,

        /// UTC date of the occurrence (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        date: NaiveDate,

        /// JSON object whose keys replace the template's details
        #[arg(value_parser = parse_payload)]
        overrides: Payload,
    },
    /// Delete one occurrence, retiring the template once a bounded series is empty
    DeleteInstance {
        template_id: uuid::Uuid,

        /// UTC date of the occurrence (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got {value:?}: {e}"))
}

fn parse_payload(value: &str) -> Result<Payload, String> {
    match serde_json::from_str(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err("overrides must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

/// Renders an instance as a single JSON line.
#[must_use]
pub fn instance_json(instance: &VirtualInstance) -> serde_json::Value {
    serde_json::json!({
        "parent_id": instance.parent_id,
        "occurrence_date": instance.occurrence_date().to_string(),
        "start_time": instance.start_time.to_rfc3339(),
        "end_time": instance.end_time.to_rfc3339(),
        "overrides_applied": instance.overrides_applied,
        "details": instance.details,
    })
}
