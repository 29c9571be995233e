//! # Structured Logging Module
//!
//! Environment-aware structured logging for debugging the callback-driven
//! continuation chain, where a single workflow spans many worker invocations.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Safe to call from multiple entry points; only the first call installs the
/// subscriber. `BATCHFLOW_ENV=production` switches to JSON output for log
/// aggregation, anything else gets human-readable console output.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        if environment == "production" {
            let subscriber = tracing_subscriber::registry().with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(filter),
            );
            // A subscriber may already be installed by the embedding process
            let _ = subscriber.try_init();
        } else {
            let subscriber = tracing_subscriber::registry().with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_filter(filter),
            );
            let _ = subscriber.try_init();
        }
    });
}

fn get_environment() -> String {
    std::env::var("BATCHFLOW_ENV").unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> String {
    match std::env::var("BATCHFLOW_LOG_LEVEL") {
        Ok(level) => level,
        Err(_) => match environment {
            "production" => "info".to_string(),
            "test" => "warn".to_string(),
            _ => "debug".to_string(),
        },
    }
}
