//! # Envelope Service
//!
//! Signs payloads with the active identity and verifies envelopes from any
//! author. For memory fragments it also stamps replay protection, admits
//! incoming fragments through the replay guard, and records provenance.

use crate::domain::envelope::{
    compute_content_hash, AuthorRef, EnvelopeVerification, ReplayStamp, SchemaRef,
    SignedEnvelope, UnsignedHeader, VerificationChecks, FRAGMENT_SCHEMA,
};
use crate::domain::provenance::{ProvenanceChain, ProvenanceOperation};
use crate::domain::share_grant::{ShareGrant, ShareGrantVerification, SHARE_GRANT_SCHEMA};
use crate::ports::inbound::FragmentEnvelopeApi;
use crate::service::provenance::ProvenanceStore;
use crate::service::replay::ReplayGuard;
use async_trait::async_trait;
use mg_telemetry::metrics::{ENVELOPES_SIGNED, VERIFICATION_FAILURES};
use serde::Serialize;
use shared_crypto::derive_fingerprint;
use shared_types::{
    FieldId, Fingerprint, IdentityProvider, MemoryFragment, SecurityError, TimeSource,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct EnvelopeService {
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn TimeSource>,
    replay: Arc<ReplayGuard>,
    provenance: Arc<ProvenanceStore>,
}

impl EnvelopeService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn TimeSource>,
        replay: Arc<ReplayGuard>,
        provenance: Arc<ProvenanceStore>,
    ) -> Self {
        Self {
            identity,
            clock,
            replay,
            provenance,
        }
    }

    pub fn replay_guard(&self) -> &Arc<ReplayGuard> {
        &self.replay
    }

    pub fn provenance(&self) -> &Arc<ProvenanceStore> {
        &self.provenance
    }

    /// Fingerprint of the active identity.
    pub fn local_fingerprint(&self) -> Result<Fingerprint, SecurityError> {
        self.identity
            .public_identity()
            .map(|identity| identity.fingerprint)
            .ok_or(SecurityError::NoIdentity)
    }

    /// Wrap `payload` in an envelope signed by the active identity.
    ///
    /// Fails with `NoIdentity` if no identity is configured.
    pub fn create_envelope<T: Serialize>(
        &self,
        payload: T,
        schema: SchemaRef,
        capabilities: Vec<String>,
        parent_hash: Option<String>,
    ) -> Result<SignedEnvelope<T>, SecurityError> {
        self.seal(payload, schema, capabilities, parent_hash, None)
    }

    /// Recompute the content hash, check author binding, signature and schema.
    ///
    /// Sub-check failures are reported in the result, not as errors.
    pub fn verify_envelope<T: Serialize>(
        &self,
        envelope: &SignedEnvelope<T>,
    ) -> Result<EnvelopeVerification, SecurityError> {
        let content_hash = compute_content_hash(&envelope.payload)? == envelope.content_hash;
        let author_binding =
            derive_fingerprint(&envelope.author.public_key) == envelope.author.fingerprint;
        let signature = self.identity.verify(
            &envelope.signing_bytes()?,
            &envelope.signature,
            &envelope.author.public_key,
        );
        let schema = envelope.schema.is_well_formed();

        let verification = EnvelopeVerification::from_checks(VerificationChecks {
            content_hash,
            author_binding,
            signature,
            schema,
        });
        if let Some(check) = verification.checks.first_failure() {
            VERIFICATION_FAILURES.with_label_values(&[check]).inc();
            warn!(
                security_event = "envelope_invalid",
                check,
                author = %envelope.author.fingerprint,
                schema = %envelope.schema.name,
                "Envelope verification failed"
            );
        }
        Ok(verification)
    }

    /// Sign a fragment with a fresh replay stamp and start its provenance chain.
    ///
    /// The fragment is not admitted; callers persisting it must call
    /// [`admit_fragment`](Self::admit_fragment) first.
    pub async fn sign_fragment(
        &self,
        fragment: MemoryFragment,
        capabilities: Vec<String>,
        parent_hash: Option<String>,
    ) -> Result<SignedEnvelope<MemoryFragment>, SecurityError> {
        let author = self.local_fingerprint()?;
        let stamp = self.replay.issue_stamp(&author).await;
        let previous = parent_hash.clone();
        let envelope = self.seal(
            fragment,
            SchemaRef::new(FRAGMENT_SCHEMA, 1),
            capabilities,
            parent_hash,
            Some(stamp),
        )?;
        let operation = if previous.is_some() {
            ProvenanceOperation::Modified
        } else {
            ProvenanceOperation::Created
        };
        self.provenance
            .append(&envelope.content_hash, operation, previous.as_deref())?;
        Ok(envelope)
    }

    /// Ingest path: verify the envelope and consume its replay stamp.
    ///
    /// Returns the verification; an invalid envelope never touches the
    /// replay guard.
    pub async fn admit_fragment(
        &self,
        envelope: &SignedEnvelope<MemoryFragment>,
    ) -> Result<EnvelopeVerification, SecurityError> {
        let verification = self.verify_envelope(envelope)?;
        if !verification.valid {
            return Ok(verification);
        }
        let stamp = envelope
            .replay
            .as_ref()
            .ok_or_else(|| SecurityError::Validation("fragment has no replay stamp".into()))?;
        self.replay
            .verify(&envelope.author.fingerprint, &envelope.content_hash, stamp)
            .await?;
        debug!(
            fragment_id = %envelope.payload.id,
            epoch = stamp.epoch,
            "Fragment admitted"
        );
        Ok(verification)
    }

    /// Read path: verify the envelope and confirm it was admitted once.
    pub async fn verify_stored(
        &self,
        envelope: &SignedEnvelope<MemoryFragment>,
    ) -> Result<EnvelopeVerification, SecurityError> {
        let verification = self.verify_envelope(envelope)?;
        if !verification.valid {
            return Ok(verification);
        }
        let stamp = envelope
            .replay
            .as_ref()
            .ok_or_else(|| SecurityError::Validation("fragment has no replay stamp".into()))?;
        self.replay
            .confirm_admitted(&envelope.author.fingerprint, &envelope.content_hash, stamp)
            .await?;
        Ok(verification)
    }

    /// Sign a grant of `capabilities` on `field_id` to `grantee`, valid for `ttl_ms`.
    pub fn create_share_grant(
        &self,
        field_id: FieldId,
        grantee: Fingerprint,
        capabilities: Vec<String>,
        ttl_ms: u64,
    ) -> Result<SignedEnvelope<ShareGrant>, SecurityError> {
        if capabilities.is_empty() {
            return Err(SecurityError::Validation(
                "share grant must name at least one capability".into(),
            ));
        }
        let issued_at = self.clock.now();
        let grant = ShareGrant {
            grant_id: uuid::Uuid::new_v4().to_string(),
            field_id,
            grantor: self.local_fingerprint()?,
            grantee,
            capabilities: capabilities.clone(),
            issued_at,
            expires_at: issued_at.saturating_add(ttl_ms),
        };
        self.create_envelope(grant, SchemaRef::new(SHARE_GRANT_SCHEMA, 1), capabilities, None)
    }

    /// Verify a grant for `expected_grantee`. `scope_allows` decides whether a
    /// granted capability is permitted in the field's scope.
    pub fn verify_share_grant(
        &self,
        envelope: &SignedEnvelope<ShareGrant>,
        expected_grantee: &Fingerprint,
        scope_allows: impl Fn(&str) -> bool,
    ) -> Result<ShareGrantVerification, SecurityError> {
        let envelope_check = self.verify_envelope(envelope)?;
        let grant = &envelope.payload;
        let expired = grant.is_expired(self.clock.now());
        let grantee_matches = &grant.grantee == expected_grantee;
        let capabilities_allowed = grant.capabilities.iter().all(|c| scope_allows(c.as_str()));
        let schema_matches = envelope.schema.name == SHARE_GRANT_SCHEMA;
        let grantor_signed = grant.grantor == envelope.author.fingerprint;

        Ok(ShareGrantVerification {
            valid: envelope_check.valid
                && schema_matches
                && grantor_signed
                && !expired
                && grantee_matches
                && capabilities_allowed,
            expired,
            grantee_matches,
            capabilities_allowed,
            envelope: envelope_check,
        })
    }

    fn seal<T: Serialize>(
        &self,
        payload: T,
        schema: SchemaRef,
        capabilities: Vec<String>,
        parent_hash: Option<String>,
        replay: Option<ReplayStamp>,
    ) -> Result<SignedEnvelope<T>, SecurityError> {
        let identity = self.identity.public_identity().ok_or(SecurityError::NoIdentity)?;
        if !schema.is_well_formed() {
            return Err(SecurityError::Validation(format!(
                "malformed schema {}@{}",
                schema.name, schema.version
            )));
        }
        let header = UnsignedHeader {
            content_hash: compute_content_hash(&payload)?,
            schema,
            capabilities,
            parent_hash,
            author: AuthorRef {
                fingerprint: identity.fingerprint,
                public_key: identity.public_key,
            },
            created_at: self.clock.now(),
            replay,
        };
        let signature = self.identity.sign(&header.signing_bytes()?)?;
        ENVELOPES_SIGNED.inc();
        Ok(header.seal(payload, signature))
    }
}

#[async_trait]
impl FragmentEnvelopeApi for EnvelopeService {
    async fn create_signed_fragment(
        &self,
        fragment: MemoryFragment,
        capabilities: Vec<String>,
        parent_hash: Option<String>,
    ) -> Result<SignedEnvelope<MemoryFragment>, SecurityError> {
        self.sign_fragment(fragment, capabilities, parent_hash).await
    }

    async fn verify_fragment(
        &self,
        envelope: &SignedEnvelope<MemoryFragment>,
    ) -> Result<EnvelopeVerification, SecurityError> {
        self.admit_fragment(envelope).await
    }

    async fn verify_stored_fragment(
        &self,
        envelope: &SignedEnvelope<MemoryFragment>,
    ) -> Result<EnvelopeVerification, SecurityError> {
        self.verify_stored(envelope).await
    }

    fn resolve_provenance_chain(&self, content_hash: &str) -> Option<ProvenanceChain> {
        self.provenance.resolve(content_hash)
    }
}
