//! Candidate selection.

use crate::domain::policy::{gc_policy, GcPolicy, QUOTA_TARGET, QUOTA_WARNING};
use serde::{Deserialize, Serialize};
use shared_types::{FragmentId, MemoryFragment, Scope, Timestamp};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GcReason {
    /// Below the significance floor and past retention.
    LowSignificance,
    /// Retained: significant enough.
    Significant,
    /// Retained: too young to collect.
    WithinRetention,
    /// Excess over the field's fragment cap.
    FieldOverCapacity,
    /// Excess over the scope's storage quota.
    StorageQuota,
}

impl GcReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GcReason::LowSignificance => "low-significance",
            GcReason::Significant => "significant",
            GcReason::WithinRetention => "within-retention",
            GcReason::FieldOverCapacity => "field-over-capacity",
            GcReason::StorageQuota => "storage-quota",
        }
    }
}

impl fmt::Display for GcReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcCandidate {
    pub fragment_id: FragmentId,
    pub eligible: bool,
    pub reason: GcReason,
}

/// The two rule outputs, kept apart so callers can tell why a fragment goes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcCandidates {
    /// One verdict per fragment under the significance/retention rule.
    pub policy: Vec<GcCandidate>,
    /// Excess fragments over the field cap, lowest value first.
    pub size: Vec<GcCandidate>,
}

impl GcCandidates {
    pub fn eligible_ids(&self) -> impl Iterator<Item = &FragmentId> {
        self.policy
            .iter()
            .chain(self.size.iter())
            .filter(|c| c.eligible)
            .map(|c| &c.fragment_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaCheck {
    pub within_quota: bool,
    pub usage_percent: f64,
    pub warning: Option<String>,
}

/// Deletion plan produced by [`plan_gc`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GcPlan {
    /// Sorted, de-duplicated.
    pub deleted: Vec<FragmentId>,
    pub policy_deletions: usize,
    pub size_deletions: usize,
    pub quota_deletions: usize,
    pub freed_bytes: u64,
}

/// Lowest significance first, then oldest, then id.
fn eviction_order(a: &MemoryFragment, b: &MemoryFragment) -> Ordering {
    a.significance
        .total_cmp(&b.significance)
        .then(a.timestamp.cmp(&b.timestamp))
        .then_with(|| a.id.cmp(&b.id))
}

fn sorted_for_eviction(fragments: &[MemoryFragment]) -> Vec<&MemoryFragment> {
    let mut sorted: Vec<&MemoryFragment> = fragments.iter().collect();
    sorted.sort_by(|a, b| eviction_order(a, b));
    sorted
}

fn policy_verdict(fragment: &MemoryFragment, policy: &GcPolicy, now: Timestamp) -> GcCandidate {
    let age = now.saturating_sub(fragment.timestamp);
    let reason = if fragment.significance >= policy.min_significance {
        GcReason::Significant
    } else if age <= policy.min_retention_ms {
        GcReason::WithinRetention
    } else {
        GcReason::LowSignificance
    };
    GcCandidate {
        fragment_id: fragment.id.clone(),
        eligible: reason == GcReason::LowSignificance,
        reason,
    }
}

pub fn get_candidates(fragments: &[MemoryFragment], scope: Scope, now: Timestamp) -> GcCandidates {
    let policy = gc_policy(scope);

    let verdicts = fragments
        .iter()
        .map(|f| policy_verdict(f, &policy, now))
        .collect();

    let excess = fragments.len().saturating_sub(policy.max_fragments);
    let size = sorted_for_eviction(fragments)
        .into_iter()
        .take(excess)
        .map(|f| GcCandidate {
            fragment_id: f.id.clone(),
            eligible: true,
            reason: GcReason::FieldOverCapacity,
        })
        .collect();

    GcCandidates {
        policy: verdicts,
        size,
    }
}

pub fn check_storage_quota(scope: Scope, bytes: u64) -> QuotaCheck {
    let quota = gc_policy(scope).storage_quota_bytes;
    let usage = bytes as f64 / quota as f64;
    let warning = if bytes > quota {
        Some(format!("{scope} storage over quota: {bytes} of {quota} bytes"))
    } else if usage >= QUOTA_WARNING {
        Some(format!("{scope} storage at {:.1}% of quota", usage * 100.0))
    } else {
        None
    };
    QuotaCheck {
        within_quota: bytes <= quota,
        usage_percent: usage * 100.0,
        warning,
    }
}

/// Fragments to drop so total size falls to the quota target. Empty while
/// within quota.
fn quota_victims(fragments: &[MemoryFragment], policy: &GcPolicy) -> Vec<FragmentId> {
    let total: u64 = fragments.iter().map(MemoryFragment::size_bytes).sum();
    if total <= policy.storage_quota_bytes {
        return Vec::new();
    }
    let target = (policy.storage_quota_bytes as f64 * QUOTA_TARGET) as u64;
    let mut remaining = total;
    let mut victims = Vec::new();
    for fragment in sorted_for_eviction(fragments) {
        if remaining <= target {
            break;
        }
        remaining = remaining.saturating_sub(fragment.size_bytes());
        victims.push(fragment.id.clone());
    }
    victims
}

/// Union of policy, size and quota deletions.
pub fn plan_gc(fragments: &[MemoryFragment], scope: Scope, now: Timestamp) -> GcPlan {
    let policy = gc_policy(scope);
    let candidates = get_candidates(fragments, scope, now);
    let quota = quota_victims(fragments, &policy);

    let policy_deletions = candidates.policy.iter().filter(|c| c.eligible).count();
    let size_deletions = candidates.size.len();
    let quota_deletions = quota.len();

    let deleted: BTreeSet<FragmentId> = candidates
        .eligible_ids()
        .cloned()
        .chain(quota)
        .collect();
    let freed_bytes = fragments
        .iter()
        .filter(|f| deleted.contains(&f.id))
        .map(MemoryFragment::size_bytes)
        .sum();

    GcPlan {
        deleted: deleted.into_iter().collect(),
        policy_deletions,
        size_deletions,
        quota_deletions,
        freed_bytes,
    }
}
