//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `JOBSHOP` prefix and
//! nested values are separated by a double underscore.
//!
//! # Example
//!
//! ```no_run
//! use jobshop_core::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Solver timeout: {:?}", config.engine.solver_timeout());
//! ```

mod calendar;
mod engine;
mod error;
mod telemetry;

pub use calendar::CalendarSettings;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use telemetry::TelemetryConfig;

use serde::Deserialize;

use crate::adapters::FileCalendarLoader;

/// Root application configuration. Every section has defaults, so an empty
/// environment yields a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub calendar: CalendarSettings,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `JOBSHOP` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `JOBSHOP__ENGINE__SOLVER_TIMEOUT_SECS=60` -> `engine.solver_timeout_secs = 60`
    /// - `JOBSHOP__CALENDAR__PATH=/etc/jobshop/calendar.yaml` -> `calendar.path`
    /// - `JOBSHOP__TELEMETRY__JSON=true` -> `telemetry.json = true`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("JOBSHOP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// File calendar source for `calendar.path`, searching
    /// `engine.calendar_search_days` ahead. `None` when no path is set;
    /// use `EngineConfig::standard_calendar` then.
    pub fn calendar_loader(&self) -> Option<FileCalendarLoader> {
        self.calendar.path.as_ref().map(|path| {
            FileCalendarLoader::new(path).with_search_horizon(self.engine.calendar_search_days)
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.engine.validate()?;
        self.calendar.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests touching them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 4] = [
        "JOBSHOP__ENGINE__SOLVER_TIMEOUT_SECS",
        "JOBSHOP__ENGINE__BOTTLENECK_THRESHOLD_PERCENT",
        "JOBSHOP__CALENDAR__PATH",
        "JOBSHOP__TELEMETRY__JSON",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.calendar.path, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nested_values_are_read_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("JOBSHOP__ENGINE__SOLVER_TIMEOUT_SECS", "90");
        env::set_var("JOBSHOP__CALENDAR__PATH", "/etc/jobshop/calendar.yaml");
        env::set_var("JOBSHOP__TELEMETRY__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.engine.solver_timeout_secs, 90);
        assert_eq!(config.engine.bottleneck_threshold_percent, 85);
        assert_eq!(
            config.calendar.path.as_deref(),
            Some(std::path::Path::new("/etc/jobshop/calendar.yaml"))
        );
        assert!(config.telemetry.json);
    }

    #[tokio::test]
    async fn calendar_loader_applies_engine_search_horizon() {
        use crate::ports::CalendarSource;
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"working_hours:\n  monday: { start: \"07:00\", end: \"15:00\" }\n")
            .unwrap();
        let config = AppConfig {
            engine: EngineConfig {
                calendar_search_days: 45,
                ..EngineConfig::default()
            },
            calendar: CalendarSettings {
                path: Some(file.path().to_path_buf()),
            },
            ..AppConfig::default()
        };

        let loader = config.calendar_loader().unwrap();
        assert_eq!(loader.path(), file.path());
        let calendar = loader.load_calendar().await.unwrap();
        assert_eq!(calendar.search_horizon_days(), 45);

        assert!(AppConfig::default().calendar_loader().is_none());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("JOBSHOP__ENGINE__BOTTLENECK_THRESHOLD_PERCENT", "150");
        let result = AppConfig::load_validated();
        clear_env();

        assert!(matches!(
            result,
            Err(ConfigError::ValidationFailed(
                ValidationError::InvalidBottleneckThreshold(150)
            ))
        ));
    }
}
