use serde::{Deserialize, Serialize};
use shared_types::{Scope, DAY_MS};

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Usage fraction that triggers a quota warning.
pub const QUOTA_WARNING: f64 = 0.8;
/// Usage fraction quota-driven deletion brings a field back down to.
pub const QUOTA_TARGET: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GcPolicy {
    pub min_significance: f64,
    pub min_retention_ms: u64,
    pub max_fragments: usize,
    pub storage_quota_bytes: u64,
}

pub const fn gc_policy(scope: Scope) -> GcPolicy {
    match scope {
        Scope::Conversation => GcPolicy {
            min_significance: 0.2,
            min_retention_ms: DAY_MS,
            max_fragments: 1_000,
            storage_quota_bytes: 10 * MIB,
        },
        Scope::User => GcPolicy {
            min_significance: 0.1,
            min_retention_ms: 30 * DAY_MS,
            max_fragments: 10_000,
            storage_quota_bytes: 100 * MIB,
        },
        Scope::Organization => GcPolicy {
            min_significance: 0.05,
            min_retention_ms: 90 * DAY_MS,
            max_fragments: 100_000,
            storage_quota_bytes: GIB,
        },
        Scope::Global => GcPolicy {
            min_significance: 0.3,
            min_retention_ms: 365 * DAY_MS,
            max_fragments: 1_000_000,
            storage_quota_bytes: 10 * GIB,
        },
    }
}
