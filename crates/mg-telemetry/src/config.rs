//! Telemetry configuration.

use serde::{Deserialize, Serialize};
use std::env;

/// Logging configuration. Usable standalone via `from_env` or embedded in a
/// TOML config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full directive
    pub log_level: String,

    /// Emit JSON lines
    pub json_logs: bool,

    /// Include module targets in pretty output
    pub show_targets: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "memory-guard".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            show_targets: true,
        }
    }
}

impl TelemetryConfig {
    /// Defaults overridden by `MG_SERVICE_NAME`, `MG_LOG_LEVEL` (or `RUST_LOG`),
    /// and `MG_JSON_LOGS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply environment overrides in place.
    pub fn apply_env(&mut self) {
        if let Ok(name) = env::var("MG_SERVICE_NAME") {
            self.service_name = name;
        }
        if let Ok(level) = env::var("MG_LOG_LEVEL").or_else(|_| env::var("RUST_LOG")) {
            self.log_level = level;
        }
        if let Ok(v) = env::var("MG_JSON_LOGS") {
            self.json_logs = parse_flag(&v);
        }
    }
}

/// `true`/`1`/`yes` (any case) are truthy.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
