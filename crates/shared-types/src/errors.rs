//! # Error Types
//!
//! The security error taxonomy shared by every subsystem.
//!
//! | Variant | Retried | Logged as security event |
//! |---------|---------|--------------------------|
//! | `Validation` | never (caller bug) | no |
//! | `NoIdentity` | after reconfiguration | no |
//! | `ReplayAttack` | never | yes |
//! | `Provenance` | never | yes |
//! | `Encryption` | never | `NotAuthorized` only |
//! | `CapabilityDenied` | after trust changes | yes |
//! | `Store` | yes | no |

use crate::entities::Fingerprint;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why the replay guard rejected a fragment.
///
/// Each reason is distinct so operators can tell an attack from clock or
/// configuration drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplayReason {
    /// The replay stamp's `expires_at` is in the past.
    Expired,
    /// The `(content hash, nonce)` pair was already consumed.
    NonceReused,
    /// The epoch is not greater than the last epoch observed for the author.
    StaleEpoch,
    /// Read path: the nonce was never admitted through the write path.
    NotAdmitted,
}

impl ReplayReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplayReason::Expired => "expired",
            ReplayReason::NonceReused => "replay",
            ReplayReason::StaleEpoch => "stale-epoch",
            ReplayReason::NotAdmitted => "not-admitted",
        }
    }
}

impl fmt::Display for ReplayReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encryption and key-wrap failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncryptionFailure {
    /// The reader has no key-wrap on this fragment.
    #[error("Reader {fingerprint} is not authorized to decrypt this fragment")]
    NotAuthorized { fingerprint: Fingerprint },

    /// AEAD authentication tag did not verify.
    #[error("Decryption failed: authentication tag mismatch")]
    DecryptionFailed,

    /// The content key could not be wrapped or unwrapped.
    #[error("Key wrap failed: {0}")]
    KeyWrapFailed(String),

    /// Degraded key-wrap requested while policy requires ECDH.
    #[error("Degraded key wrap refused for reader {fingerprint}: ECDH required")]
    DegradedWrapRefused { fingerprint: Fingerprint },

    /// The exchange key is not a valid SEC1 point.
    #[error("Invalid exchange key")]
    InvalidExchangeKey,
}

/// Persistent store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record at {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

/// Errors raised by the memory security core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SecurityError {
    /// Malformed input. Never retried, never swallowed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No active identity is configured for signing.
    #[error("No identity available for signing")]
    NoIdentity,

    /// Nonce reuse, stale epoch, expiry, or unadmitted nonce.
    #[error("Replay attack detected ({reason}): {detail}")]
    ReplayAttack { reason: ReplayReason, detail: String },

    /// Provenance chain continuity violated.
    #[error("Provenance error: {0}")]
    Provenance(String),

    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionFailure),

    /// Capability gate returned DENY or CONFIRM for a write that cannot wait.
    #[error("Capability {capability} denied: {reason}")]
    CapabilityDenied { capability: String, reason: String },

    #[error("Entropy budget exceeded for field {field_id}: {reason}")]
    EntropyBudgetExceeded { field_id: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SecurityError {
    pub fn replay(reason: ReplayReason, detail: impl Into<String>) -> Self {
        SecurityError::ReplayAttack {
            reason,
            detail: detail.into(),
        }
    }

    /// Returns the replay reason if this is a replay rejection.
    pub fn replay_reason(&self) -> Option<ReplayReason> {
        match self {
            SecurityError::ReplayAttack { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Whether this failure should be logged as a security event.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            SecurityError::ReplayAttack { .. }
                | SecurityError::Provenance(_)
                | SecurityError::CapabilityDenied { .. }
                | SecurityError::Encryption(EncryptionFailure::NotAuthorized { .. })
        )
    }

    /// Only store failures are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SecurityError::Store(_))
    }
}

impl From<serde_json::Error> for SecurityError {
    fn from(e: serde_json::Error) -> Self {
        SecurityError::Serialization(e.to_string())
    }
}
