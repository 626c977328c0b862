//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over the configured level, e.g.
//! `RUST_LOG=jobshop_core::domain::validation=trace`.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::TelemetryConfig;

/// Installs the global subscriber.
///
/// Returns an error if a subscriber is already installed.
///
/// ```no_run
/// use jobshop_core::{config::AppConfig, telemetry};
///
/// let config = AppConfig::load_validated().expect("configuration");
/// telemetry::init_tracing(&config.telemetry).expect("tracing");
/// ```
pub fn init_tracing(
    config: &TelemetryConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);
    if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

/// Verbose output captured by the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
