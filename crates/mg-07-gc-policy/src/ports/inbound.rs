use crate::domain::policy::GcPolicy;
use crate::domain::selection::{GcCandidates, GcPlan, QuotaCheck};
use shared_types::{MemoryFragment, Scope, Timestamp};

pub trait GcPolicyApi: Send + Sync {
    fn get_gc_policy(&self, scope: Scope) -> GcPolicy;

    fn get_candidates(&self, fragments: &[MemoryFragment], scope: Scope, now: Timestamp)
        -> GcCandidates;

    fn check_storage_quota(&self, scope: Scope, bytes: u64) -> QuotaCheck;

    fn perform_gc(&self, fragments: &[MemoryFragment], scope: Scope, now: Timestamp) -> GcPlan;
}
