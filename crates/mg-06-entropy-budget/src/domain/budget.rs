//! Budget table and ledger arithmetic.

use serde::{Deserialize, Serialize};
use shared_types::{FieldId, Scope, Timestamp, HOUR_MS};

/// Utilization at which checks start carrying a warning.
pub const WARNING_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropyBudget {
    pub max_fragment_entropy: f64,
    pub field_cap: f64,
    pub cooling_per_hour: f64,
}

pub const fn entropy_budget(scope: Scope) -> EntropyBudget {
    match scope {
        Scope::Conversation => EntropyBudget {
            max_fragment_entropy: 6.0,
            field_cap: 500.0,
            cooling_per_hour: 50.0,
        },
        Scope::User => EntropyBudget {
            max_fragment_entropy: 6.5,
            field_cap: 2_000.0,
            cooling_per_hour: 20.0,
        },
        Scope::Organization => EntropyBudget {
            max_fragment_entropy: 7.0,
            field_cap: 10_000.0,
            cooling_per_hour: 10.0,
        },
        Scope::Global => EntropyBudget {
            max_fragment_entropy: 7.5,
            field_cap: 50_000.0,
            cooling_per_hour: 5.0,
        },
    }
}

/// Usage state of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldLedger {
    pub scope: Scope,
    pub usage: f64,
    pub last_updated: Timestamp,
}

impl FieldLedger {
    pub fn new(scope: Scope, now: Timestamp) -> Self {
        Self {
            scope,
            usage: 0.0,
            last_updated: now,
        }
    }
}

/// Decay `ledger.usage` by the scope's cooling rate for the time elapsed
/// since the last update. Usage never drops below zero and a clock that
/// moved backwards cools nothing.
pub fn apply_cooling(ledger: &mut FieldLedger, now: Timestamp) {
    let elapsed_ms = now.saturating_sub(ledger.last_updated);
    let hours = elapsed_ms as f64 / HOUR_MS as f64;
    let rate = entropy_budget(ledger.scope).cooling_per_hour;
    ledger.usage = (ledger.usage - rate * hours).max(0.0);
    ledger.last_updated = ledger.last_updated.max(now);
}

/// Result of `check_budget`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCheck {
    pub allowed: bool,
    pub current_usage: f64,
    pub budget_remaining: f64,
    pub warning: Option<String>,
    /// Why the write was rejected.
    pub reason: Option<String>,
}

/// Snapshot returned by `get_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyStatus {
    pub field_id: FieldId,
    pub scope: Scope,
    pub usage: f64,
    pub cap: f64,
    pub remaining: f64,
    pub utilization: f64,
    pub last_updated: Timestamp,
}

impl EntropyStatus {
    pub fn from_ledger(field_id: &str, ledger: &FieldLedger) -> Self {
        let cap = entropy_budget(ledger.scope).field_cap;
        Self {
            field_id: field_id.to_string(),
            scope: ledger.scope,
            usage: ledger.usage,
            cap,
            remaining: (cap - ledger.usage).max(0.0),
            utilization: ledger.usage / cap,
            last_updated: ledger.last_updated,
        }
    }
}
