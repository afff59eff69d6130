//! # Memory Security Service
//!
//! The single surface a memory-field service talks to. Every operation
//! delegates to the owning subsystem; this layer only adapts types and turns
//! gate decisions into errors where a caller needs a hard stop.

use crate::container::SubsystemContainer;
use mg_01_envelope::{
    EnvelopeVerification, FragmentEnvelopeApi, ProvenanceChain, ProvenanceOperation,
    ShareGrant, ShareGrantVerification, SignedEnvelope,
};
use mg_02_semantic_validation::{SemanticValidation, SemanticValidationApi};
use mg_03_capability_gate::{is_capability_allowed, CapabilityGateApi};
use mg_04_encryption::{EncryptedFragment, EncryptionApi, ReaderKey};
use mg_05_fold_redaction::{FoldOperation, FoldRedactionApi, FragmentMapping, PrivacyPolicy};
use mg_06_entropy_budget::{entropy_budget, BudgetCheck, EntropyBudget, EntropyStatus};
use mg_07_gc_policy::{GcCandidates, GcPlan, GcPolicy, GcPolicyApi, QuotaCheck};
use shared_types::{
    CapabilityDecision, FieldId, Fingerprint, MemoryFragment, PublicIdentity, Scope,
    SecurityError, Timestamp, TrustAssessment, TrustDecision,
};
use std::sync::Arc;
use tracing::debug;

pub struct MemorySecurityService {
    container: Arc<SubsystemContainer>,
}

impl MemorySecurityService {
    pub fn new(container: Arc<SubsystemContainer>) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &Arc<SubsystemContainer> {
        &self.container
    }

    pub fn public_identity(&self) -> Option<PublicIdentity> {
        self.container.identity.public_identity()
    }

    pub fn now(&self) -> Timestamp {
        self.container.clock.now()
    }

    // =========================================================================
    // ENVELOPES AND PROVENANCE
    // =========================================================================

    pub async fn create_signed_fragment(
        &self,
        fragment: MemoryFragment,
        capabilities: Vec<String>,
        parent_hash: Option<String>,
    ) -> Result<SignedEnvelope<MemoryFragment>, SecurityError> {
        self.container
            .envelopes
            .create_signed_fragment(fragment, capabilities, parent_hash)
            .await
    }

    pub async fn verify_fragment(
        &self,
        envelope: &SignedEnvelope<MemoryFragment>,
    ) -> Result<EnvelopeVerification, SecurityError> {
        self.container.envelopes.verify_fragment(envelope).await
    }

    pub async fn verify_stored_fragment(
        &self,
        envelope: &SignedEnvelope<MemoryFragment>,
    ) -> Result<EnvelopeVerification, SecurityError> {
        self.container.envelopes.verify_stored_fragment(envelope).await
    }

    pub fn resolve_provenance_chain(&self, content_hash: &str) -> Option<ProvenanceChain> {
        self.container.envelopes.resolve_provenance_chain(content_hash)
    }

    /// Record that `target_hash` was folded from `source_hash`. With
    /// `preserve_history` the target chain starts from the source history.
    pub fn record_fold_provenance(
        &self,
        source_hash: &str,
        target_hash: &str,
        preserve_history: bool,
    ) -> Result<ProvenanceChain, SecurityError> {
        let provenance = &self.container.provenance;
        if preserve_history {
            provenance.derive(source_hash, target_hash, ProvenanceOperation::Folded)
        } else {
            provenance.append(target_hash, ProvenanceOperation::Folded, Some(source_hash))
        }
    }

    // =========================================================================
    // SHARE GRANTS
    // =========================================================================

    pub fn create_share_grant(
        &self,
        field_id: FieldId,
        grantee: Fingerprint,
        capabilities: Vec<String>,
        ttl_ms: u64,
    ) -> Result<SignedEnvelope<ShareGrant>, SecurityError> {
        self.container
            .envelopes
            .create_share_grant(field_id, grantee, capabilities, ttl_ms)
    }

    /// Verify a grant against the static capability table of `scope`.
    pub fn verify_share_grant(
        &self,
        envelope: &SignedEnvelope<ShareGrant>,
        expected_grantee: &Fingerprint,
        scope: Scope,
    ) -> Result<ShareGrantVerification, SecurityError> {
        self.container
            .envelopes
            .verify_share_grant(envelope, expected_grantee, |capability| {
                is_capability_allowed(capability, scope)
            })
    }

    // =========================================================================
    // VALIDATION AND CAPABILITIES
    // =========================================================================

    /// Score and enforce. Fails only in strict scopes.
    pub fn validate_semantics(
        &self,
        fragment: &MemoryFragment,
        field_signature: &[f64],
        scope: Scope,
    ) -> Result<SemanticValidation, SecurityError> {
        self.container
            .validator
            .enforce(fragment, field_signature, scope)
    }

    pub async fn check_memory_capability(
        &self,
        capability: &str,
        scope: Scope,
        trust: &TrustAssessment,
    ) -> TrustDecision {
        self.container
            .gate
            .check_capability(capability, scope, trust)
            .await
    }

    /// `check_memory_capability`, with anything but `ALLOW` as an error.
    /// `CONFIRM` needs an interactive confirmation this layer cannot obtain.
    pub async fn require_capability(
        &self,
        capability: &str,
        scope: Scope,
        trust: &TrustAssessment,
    ) -> Result<(), SecurityError> {
        let decision = self.check_memory_capability(capability, scope, trust).await;
        match decision.decision {
            CapabilityDecision::Allow => Ok(()),
            CapabilityDecision::Confirm => Err(SecurityError::CapabilityDenied {
                capability: capability.to_string(),
                reason: decision
                    .reason
                    .unwrap_or_else(|| "confirmation required".to_string()),
            }),
            CapabilityDecision::Deny => Err(SecurityError::CapabilityDenied {
                capability: capability.to_string(),
                reason: decision.reason.unwrap_or_else(|| "denied".to_string()),
            }),
        }
    }

    // =========================================================================
    // ENCRYPTION AND FOLDS
    // =========================================================================

    pub fn encrypt_fragment(
        &self,
        fragment: &MemoryFragment,
        readers: &[ReaderKey],
    ) -> Result<EncryptedFragment, SecurityError> {
        self.container.encryption.encrypt_fragment(fragment, readers)
    }

    pub fn decrypt_fragment(
        &self,
        encrypted: &EncryptedFragment,
        reader: &Fingerprint,
        sender_exchange_key: Option<&[u8]>,
    ) -> Result<MemoryFragment, SecurityError> {
        self.container
            .encryption
            .decrypt_fragment(encrypted, reader, sender_exchange_key)
    }

    pub fn redact_fragment_for_fold(
        &self,
        fragment: &MemoryFragment,
        policy: &PrivacyPolicy,
    ) -> MemoryFragment {
        self.container.folds.redact_fragment_for_fold(fragment, policy)
    }

    pub fn create_fold_operation(
        &self,
        source_field_id: FieldId,
        target_field_id: FieldId,
        mappings: Vec<FragmentMapping>,
        privacy: PrivacyPolicy,
    ) -> Result<SignedEnvelope<FoldOperation>, SecurityError> {
        self.container
            .folds
            .create_fold_operation(source_field_id, target_field_id, mappings, privacy)
    }

    // =========================================================================
    // ENTROPY BUDGET
    // =========================================================================

    pub fn check_entropy_budget(&self, field_id: &str, scope: Scope, incoming: f64) -> BudgetCheck {
        self.container.entropy.check_budget(field_id, scope, incoming)
    }

    pub fn consume_entropy(&self, field_id: &str, entropy: f64) -> Result<EntropyStatus, SecurityError> {
        let status = self.container.entropy.consume(field_id, entropy)?;
        debug!(field_id, entropy, usage = status.usage, "Entropy consumed");
        Ok(status)
    }

    pub fn get_entropy_status(&self, field_id: &str) -> Option<EntropyStatus> {
        self.container.entropy.get_status(field_id)
    }

    pub fn get_entropy_budget(&self, scope: Scope) -> EntropyBudget {
        entropy_budget(scope)
    }

    // =========================================================================
    // GARBAGE COLLECTION
    // =========================================================================

    pub fn get_gc_policy(&self, scope: Scope) -> GcPolicy {
        self.container.gc.get_gc_policy(scope)
    }

    pub fn get_gc_candidates(
        &self,
        fragments: &[MemoryFragment],
        scope: Scope,
        now: Timestamp,
    ) -> GcCandidates {
        self.container.gc.get_candidates(fragments, scope, now)
    }

    pub fn check_storage_quota(&self, scope: Scope, bytes: u64) -> QuotaCheck {
        self.container.gc.check_storage_quota(scope, bytes)
    }

    pub fn perform_gc(&self, fragments: &[MemoryFragment], scope: Scope, now: Timestamp) -> GcPlan {
        self.container.gc.perform_gc(fragments, scope, now)
    }
}
