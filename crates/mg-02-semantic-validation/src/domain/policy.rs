//! Static per-scope validation thresholds.

use serde::Serialize;
use shared_types::Scope;

/// Significance at or above which content must meet the entropy floor.
pub const HIGH_SIGNIFICANCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationPolicy {
    /// Minimum Shannon entropy (bits/char) for high-significance content.
    pub min_entropy: f64,
    /// Reject instead of warn when the floor is missed.
    pub strict: bool,
}

pub const fn validation_policy(scope: Scope) -> ValidationPolicy {
    match scope {
        Scope::Conversation => ValidationPolicy {
            min_entropy: 0.0,
            strict: false,
        },
        Scope::User => ValidationPolicy {
            min_entropy: 1.0,
            strict: false,
        },
        Scope::Organization => ValidationPolicy {
            min_entropy: 2.0,
            strict: false,
        },
        Scope::Global => ValidationPolicy {
            min_entropy: 3.0,
            strict: true,
        },
    }
}
