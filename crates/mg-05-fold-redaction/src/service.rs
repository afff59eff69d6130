//! # Fold Service
//!
//! Redaction plus fold-operation signing through the envelope service.

use crate::domain::fold::{FoldOperation, FragmentMapping, FOLD_SCHEMA};
use crate::domain::privacy::PrivacyPolicy;
use crate::domain::redaction::redact;
use crate::ports::inbound::FoldRedactionApi;
use mg_01_envelope::{EnvelopeService, SchemaRef, SignedEnvelope};
use shared_types::{FieldId, MemoryFragment, SecurityError, TimeSource};
use std::sync::Arc;
use tracing::info;

pub struct FoldService {
    envelopes: Arc<EnvelopeService>,
    clock: Arc<dyn TimeSource>,
}

impl FoldService {
    pub fn new(envelopes: Arc<EnvelopeService>, clock: Arc<dyn TimeSource>) -> Self {
        Self { envelopes, clock }
    }

    /// Sign a description of a fold batch. Nothing is moved.
    pub fn create_fold_operation(
        &self,
        source_field_id: FieldId,
        target_field_id: FieldId,
        mappings: Vec<FragmentMapping>,
        privacy: PrivacyPolicy,
    ) -> Result<SignedEnvelope<FoldOperation>, SecurityError> {
        if source_field_id == target_field_id {
            return Err(SecurityError::Validation(format!(
                "cannot fold field {source_field_id} into itself"
            )));
        }
        let operation = FoldOperation {
            source_field_id,
            target_field_id,
            mappings,
            actor: self.envelopes.local_fingerprint()?,
            timestamp: self.clock.now(),
            privacy,
        };
        let capabilities = vec!["memory:fold".to_string()];
        let envelope = self.envelopes.create_envelope(
            operation,
            SchemaRef::new(FOLD_SCHEMA, 1),
            capabilities,
            None,
        )?;
        info!(
            source = %envelope.payload.source_field_id,
            target = %envelope.payload.target_field_id,
            fragments = envelope.payload.mappings.len(),
            "Fold operation signed"
        );
        Ok(envelope)
    }
}

impl FoldRedactionApi for FoldService {
    fn redact_fragment_for_fold(
        &self,
        fragment: &MemoryFragment,
        policy: &PrivacyPolicy,
    ) -> MemoryFragment {
        redact(fragment, policy)
    }

    fn create_fold_operation(
        &self,
        source_field_id: FieldId,
        target_field_id: FieldId,
        mappings: Vec<FragmentMapping>,
        privacy: PrivacyPolicy,
    ) -> Result<SignedEnvelope<FoldOperation>, SecurityError> {
        FoldService::create_fold_operation(self, source_field_id, target_field_id, mappings, privacy)
    }
}
