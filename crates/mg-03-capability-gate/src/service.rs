//! # Capability Gate Service

use crate::domain::table::is_capability_allowed;
use crate::ports::inbound::CapabilityGateApi;
use async_trait::async_trait;
use mg_telemetry::metrics::CAPABILITY_DECISIONS;
use shared_types::{CapabilityDecision, Scope, TrustAssessment, TrustDecision, TrustEvaluator};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct CapabilityGate {
    trust: Option<Arc<dyn TrustEvaluator>>,
}

impl CapabilityGate {
    pub fn new(trust: Option<Arc<dyn TrustEvaluator>>) -> Self {
        Self { trust }
    }

    /// Gate with no trust evaluator: the static table alone decides.
    pub fn permissive() -> Self {
        Self::new(None)
    }

    async fn delegate(&self, capability: &str, trust: &TrustAssessment) -> TrustDecision {
        let Some(evaluator) = &self.trust else {
            return TrustDecision::allow();
        };
        match evaluator.check_capability(capability, trust).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(
                    security_event = "trust_evaluator_failed",
                    capability,
                    subject = %trust.subject,
                    error = %e,
                    "Trust evaluator failed; denying"
                );
                TrustDecision::deny(format!("trust evaluation failed: {e}"))
            }
        }
    }
}

#[async_trait]
impl CapabilityGateApi for CapabilityGate {
    async fn check_capability(
        &self,
        capability: &str,
        scope: Scope,
        trust: &TrustAssessment,
    ) -> TrustDecision {
        let decision = if is_capability_allowed(capability, scope) {
            self.delegate(capability, trust).await
        } else {
            TrustDecision::deny(format!("{capability} is not permitted in {scope} scope"))
        };

        CAPABILITY_DECISIONS
            .with_label_values(&[scope.as_str(), decision.decision.as_str()])
            .inc();
        if decision.decision == CapabilityDecision::Deny {
            warn!(
                security_event = "capability_denied",
                capability,
                scope = %scope,
                subject = %trust.subject,
                reason = decision.reason.as_deref().unwrap_or(""),
                "Capability denied"
            );
        } else {
            debug!(capability, scope = %scope, decision = decision.decision.as_str(), "Capability checked");
        }
        decision
    }
}
