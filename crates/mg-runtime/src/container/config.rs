//! # Memory Guard Configuration
//!
//! One TOML document with a section per subsystem. Every field has a
//! default, so an empty file is a valid configuration.
//!
//! ```toml
//! [replay]
//! nonce_ttl_ms = 300000
//!
//! [encryption]
//! key_wrap_policy = "require-ecdh"
//!
//! [telemetry]
//! log_level = "debug"
//! ```
//!
//! ## Environment Overrides
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `MG_LOG_LEVEL`, `MG_JSON_LOGS`, `MG_SERVICE_NAME` | telemetry section |
//! | `MG_ALLOW_DEGRADED_KEY_WRAP` | `false` selects `require-ecdh` |
//! | `MG_NONCE_TTL_SECS` | replay stamp lifetime in seconds |

use mg_01_envelope::{ProvenanceConfig, ReplayConfig};
use mg_04_encryption::{EncryptionConfig, KeyWrapPolicy};
use mg_telemetry::{parse_flag, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryGuardConfig {
    pub replay: ReplayConfig,
    pub provenance: ProvenanceConfig,
    pub encryption: EncryptionConfig,
    pub telemetry: TelemetryConfig,
}

impl MemoryGuardConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `MG_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.telemetry.apply_env();
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Unparseable values are
    /// logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("MG_ALLOW_DEGRADED_KEY_WRAP") {
            self.encryption.key_wrap_policy = if parse_flag(&value) {
                KeyWrapPolicy::AllowDegraded
            } else {
                KeyWrapPolicy::RequireEcdh
            };
        }
        if let Some(value) = lookup("MG_NONCE_TTL_SECS") {
            match value.trim().parse::<u64>() {
                Ok(secs) => self.replay.nonce_ttl_ms = secs.saturating_mul(1_000),
                Err(e) => warn!(value = %value, error = %e, "Ignoring invalid MG_NONCE_TTL_SECS"),
            }
        }
    }
}
