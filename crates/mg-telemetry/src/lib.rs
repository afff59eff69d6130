//! # Memory Guard Telemetry
//!
//! Logging initialisation and security metrics shared by every subsystem.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mg_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MG_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `MG_JSON_LOGS` | `false` | Emit JSON lines instead of pretty output |
//! | `MG_SERVICE_NAME` | `memory-guard` | Service name attached to startup logs |
//!
//! ## Security Events
//!
//! Replay rejections, capability denials, degraded key-wraps, and global-scope
//! exclusions are logged at `warn` with a `security_event` field so they can be
//! filtered out of the general log stream.

mod config;
mod logging;
pub mod metrics;

pub use config::{parse_flag, TelemetryConfig};
pub use logging::init_logging;
pub use metrics::{gather_metrics, register_metrics};

use thiserror::Error;

/// Telemetry initialisation errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics, then install the global subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)?;
    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}
