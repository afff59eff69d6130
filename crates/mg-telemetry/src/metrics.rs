//! Prometheus metrics for Memory Guard.
//!
//! All metrics follow the naming convention: `mg_<component>_<metric>_total`.
//! Counters are always safe to increment; they only appear in
//! [`gather_metrics`] output after [`register_metrics`] has run.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ENVELOPE METRICS
    // =========================================================================

    /// Envelopes signed
    pub static ref ENVELOPES_SIGNED: IntCounter = IntCounter::new(
        "mg_envelope_signed_total",
        "Total envelopes signed by the local identity"
    ).expect("metric creation failed");

    /// Envelope verification failures by first failing check
    pub static ref VERIFICATION_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("mg_envelope_verification_failures_total", "Envelope verification failures"),
        &["check"]  // content_hash, author_binding, signature, schema
    ).expect("metric creation failed");

    /// Replay guard rejections by reason
    pub static ref REPLAY_REJECTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("mg_replay_rejections_total", "Fragments rejected by the replay guard"),
        &["reason"]  // expired, replay, stale-epoch, not-admitted
    ).expect("metric creation failed");

    // =========================================================================
    // POLICY METRICS
    // =========================================================================

    /// Capability decisions
    pub static ref CAPABILITY_DECISIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("mg_capability_decisions_total", "Capability gate decisions"),
        &["scope", "decision"]
    ).expect("metric creation failed");

    /// Entropy budget rejections
    pub static ref ENTROPY_REJECTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("mg_entropy_rejections_total", "Writes rejected by the entropy budget"),
        &["scope"]
    ).expect("metric creation failed");

    /// Semantic validation failures
    pub static ref SEMANTIC_REJECTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("mg_semantic_failures_total", "Fragments failing the scope significance floor"),
        &["scope", "outcome"]  // outcome: rejected, warned
    ).expect("metric creation failed");

    // =========================================================================
    // ENCRYPTION METRICS
    // =========================================================================

    /// Key-wraps by method
    pub static ref KEY_WRAPS: IntCounterVec = IntCounterVec::new(
        Opts::new("mg_encryption_key_wraps_total", "Per-reader content key wraps"),
        &["method"]  // ecdh, degraded
    ).expect("metric creation failed");

    // =========================================================================
    // GC METRICS
    // =========================================================================

    /// Fragments deleted by GC
    pub static ref GC_DELETIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("mg_gc_deletions_total", "Fragments deleted by garbage collection"),
        &["scope"]
    ).expect("metric creation failed");
}

static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Register all metrics with the global registry. Idempotent.
pub fn register_metrics() -> Result<(), TelemetryError> {
    REGISTERED
        .get_or_init(|| {
            let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
                Box::new(ENVELOPES_SIGNED.clone()),
                Box::new(VERIFICATION_FAILURES.clone()),
                Box::new(REPLAY_REJECTIONS.clone()),
                Box::new(CAPABILITY_DECISIONS.clone()),
                Box::new(ENTROPY_REJECTIONS.clone()),
                Box::new(SEMANTIC_REJECTIONS.clone()),
                Box::new(KEY_WRAPS.clone()),
                Box::new(GC_DELETIONS.clone()),
            ];
            for metric in metrics {
                REGISTRY.register(metric).map_err(|e| e.to_string())?;
            }
            Ok(())
        })
        .clone()
        .map_err(TelemetryError::MetricsInit)
}

/// Encode all registered metrics in the Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
