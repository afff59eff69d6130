//! # GC Service
//!
//! Thin stateless wrapper over the selection rules that reports deletions.

use crate::domain::policy::{gc_policy, GcPolicy};
use crate::domain::selection::{self, GcCandidates, GcPlan, QuotaCheck};
use crate::ports::inbound::GcPolicyApi;
use mg_telemetry::metrics::GC_DELETIONS;
use shared_types::{MemoryFragment, Scope, Timestamp};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct GcService;

impl GcService {
    pub fn new() -> Self {
        Self
    }
}

impl GcPolicyApi for GcService {
    fn get_gc_policy(&self, scope: Scope) -> GcPolicy {
        gc_policy(scope)
    }

    fn get_candidates(
        &self,
        fragments: &[MemoryFragment],
        scope: Scope,
        now: Timestamp,
    ) -> GcCandidates {
        selection::get_candidates(fragments, scope, now)
    }

    fn check_storage_quota(&self, scope: Scope, bytes: u64) -> QuotaCheck {
        let check = selection::check_storage_quota(scope, bytes);
        if let Some(warning) = &check.warning {
            warn!(scope = %scope, bytes, usage_percent = check.usage_percent, "{warning}");
        }
        check
    }

    fn perform_gc(&self, fragments: &[MemoryFragment], scope: Scope, now: Timestamp) -> GcPlan {
        let plan = selection::plan_gc(fragments, scope, now);
        if !plan.deleted.is_empty() {
            GC_DELETIONS
                .with_label_values(&[scope.as_str()])
                .inc_by(plan.deleted.len() as u64);
            info!(
                scope = %scope,
                deleted = plan.deleted.len(),
                policy = plan.policy_deletions,
                size = plan.size_deletions,
                quota = plan.quota_deletions,
                freed_bytes = plan.freed_bytes,
                "Garbage collection planned"
            );
        }
        plan
    }
}
