use anyhow::Result;
use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub recurrence: RecurrenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Limits applied by the occurrence expander and lifecycle manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RecurrenceConfig {
    /// Maximum number of virtual instances a single expansion may return.
    pub max_instances: usize,
    /// Largest bounded series the exhaustion check will enumerate in full.
    /// Longer series are never auto-retired.
    pub exhaustion_scan_limit: usize,
}

impl RecurrenceConfig {
    pub const DEFAULT_MAX_INSTANCES: usize = 1000;
    pub const DEFAULT_EXHAUSTION_SCAN_LIMIT: usize = 10_000;

    /// ## Summary
    /// Rejects limits that would make every expansion or exhaustion check fail.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` if either limit is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_instances == 0 {
            return Err(CoreError::ConfigError(
                "recurrence.max_instances must be at least 1".to_string(),
            ));
        }
        if self.exhaustion_scan_limit == 0 {
            return Err(CoreError::ConfigError(
                "recurrence.exhaustion_scan_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            max_instances: Self::DEFAULT_MAX_INSTANCES,
            exhaustion_scan_limit: Self::DEFAULT_EXHAUSTION_SCAN_LIMIT,
        }
    }
}

impl Settings {
    /// ## Summary
    /// Returns a configuration builder pre-populated with every default.
    ///
    /// ## Errors
    /// Returns an error if a default value cannot be registered.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "info")?
            .set_default(
                "recurrence.max_instances",
                i64::try_from(RecurrenceConfig::DEFAULT_MAX_INSTANCES)?,
            )?
            .set_default(
                "recurrence.exhaustion_scan_limit",
                i64::try_from(RecurrenceConfig::DEFAULT_EXHAUSTION_SCAN_LIMIT)?,
            )?)
    }

    /// ## Summary
    /// Loads configuration from environment variables and an optional `config.toml`.
    /// Environment variables take precedence over file values.
    ///
    /// Variables are prefixed with `KAIROS_` and nested with `__`, e.g.
    /// `KAIROS_DATABASE__URL` or `KAIROS_RECURRENCE__MAX_INSTANCES`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration, deserializing it, or
    /// validating the recurrence limits fails.
    pub fn load() -> Result<Self> {
        let settings = Self::defaults()?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env
            .add_source(
                config::Environment::with_prefix("KAIROS")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.recurrence.validate()?;
        tracing::debug!(recurrence = ?settings.recurrence, "Configuration loaded");
        Ok(settings)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
