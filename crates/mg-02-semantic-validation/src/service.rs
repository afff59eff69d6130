//! # Semantic Validator Service

use crate::domain::policy::{validation_policy, HIGH_SIGNIFICANCE};
use crate::domain::scoring::{coherence, prime_alignment, shannon_entropy, SemanticValidation};
use crate::ports::inbound::SemanticValidationApi;
use mg_telemetry::metrics::SEMANTIC_REJECTIONS;
use shared_types::{MemoryFragment, Scope, SecurityError};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct SemanticValidator;

impl SemanticValidator {
    pub fn new() -> Self {
        Self
    }
}

fn check_inputs(fragment: &MemoryFragment, field_signature: &[f64]) -> Result<(), SecurityError> {
    if !(0.0..=1.0).contains(&fragment.significance) {
        return Err(SecurityError::Validation(format!(
            "significance {} outside [0, 1] for fragment {}",
            fragment.significance, fragment.id
        )));
    }
    if fragment
        .prime_factors
        .iter()
        .chain(field_signature)
        .any(|v| !v.is_finite())
    {
        return Err(SecurityError::Validation(format!(
            "non-finite semantic coordinate in fragment {}",
            fragment.id
        )));
    }
    Ok(())
}

impl SemanticValidationApi for SemanticValidator {
    fn validate(
        &self,
        fragment: &MemoryFragment,
        field_signature: &[f64],
        scope: Scope,
    ) -> Result<SemanticValidation, SecurityError> {
        check_inputs(fragment, field_signature)?;
        let policy = validation_policy(scope);
        let alignment = prime_alignment(&fragment.prime_factors, field_signature);
        let entropy = shannon_entropy(&fragment.content);

        Ok(SemanticValidation {
            prime_alignment: alignment,
            entropy_score: entropy,
            significance_verified: fragment.significance < HIGH_SIGNIFICANCE
                || entropy >= policy.min_entropy,
            coherence_score: coherence(alignment, entropy),
        })
    }

    fn enforce(
        &self,
        fragment: &MemoryFragment,
        field_signature: &[f64],
        scope: Scope,
    ) -> Result<SemanticValidation, SecurityError> {
        let result = self.validate(fragment, field_signature, scope)?;
        if result.significance_verified {
            debug!(
                fragment_id = %fragment.id,
                scope = %scope,
                coherence = result.coherence_score,
                "Semantic validation passed"
            );
            return Ok(result);
        }

        let policy = validation_policy(scope);
        if policy.strict {
            SEMANTIC_REJECTIONS
                .with_label_values(&[scope.as_str(), "rejected"])
                .inc();
            return Err(SecurityError::Validation(format!(
                "fragment {} has significance {:.2} but entropy {:.3} below {} floor {:.1}",
                fragment.id, fragment.significance, result.entropy_score, scope, policy.min_entropy
            )));
        }

        SEMANTIC_REJECTIONS
            .with_label_values(&[scope.as_str(), "warned"])
            .inc();
        warn!(
            fragment_id = %fragment.id,
            scope = %scope,
            entropy = result.entropy_score,
            min_entropy = policy.min_entropy,
            "High-significance fragment below entropy floor; accepted in non-strict scope"
        );
        Ok(result)
    }
}
