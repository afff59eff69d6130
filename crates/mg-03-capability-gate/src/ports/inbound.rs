//! # Inbound Ports (Driving Ports / API)

use async_trait::async_trait;
use shared_types::{Scope, TrustAssessment, TrustDecision};

#[async_trait]
pub trait CapabilityGateApi: Send + Sync {
    /// Decide whether `capability` may be exercised in `scope`.
    ///
    /// Never fails: evaluator errors become `DENY`.
    async fn check_capability(
        &self,
        capability: &str,
        scope: Scope,
        trust: &TrustAssessment,
    ) -> TrustDecision;
}
