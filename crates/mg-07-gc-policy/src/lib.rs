//! # GC Policy Subsystem (MG-07)
//!
//! Decides which fragments of a field may be deleted. Pure functions over a
//! fragment snapshot; the caller performs the deletions.
//!
//! ## Rules
//!
//! | Rule | Trigger | Selection |
//! |------|---------|-----------|
//! | Policy | significance below floor **and** older than retention | every match |
//! | Size | field holds more than `max_fragments` | lowest significance, then oldest, down to the cap |
//! | Quota | stored bytes over quota | lowest significance, then oldest, down to 90% of quota |
//!
//! `perform_gc` is the sorted union of all three and is idempotent for a
//! fixed `now`.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::policy::{gc_policy, GcPolicy, QUOTA_TARGET, QUOTA_WARNING};
pub use domain::selection::{
    check_storage_quota, get_candidates, plan_gc, GcCandidate, GcCandidates, GcPlan, GcReason,
    QuotaCheck,
};
pub use ports::inbound::GcPolicyApi;
pub use service::GcService;
