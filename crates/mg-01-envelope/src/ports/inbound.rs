//! # Inbound Ports (Driving Ports / API)
//!
//! Fragment-level envelope operations used by the security service.

use crate::domain::envelope::{EnvelopeVerification, SignedEnvelope};
use crate::domain::provenance::ProvenanceChain;
use async_trait::async_trait;
use shared_types::{MemoryFragment, SecurityError};

/// Signing and verification of memory fragments.
#[async_trait]
pub trait FragmentEnvelopeApi: Send + Sync {
    /// Sign with a fresh replay stamp and record `created`/`modified` provenance.
    async fn create_signed_fragment(
        &self,
        fragment: MemoryFragment,
        capabilities: Vec<String>,
        parent_hash: Option<String>,
    ) -> Result<SignedEnvelope<MemoryFragment>, SecurityError>;

    /// Ingest path. Consumes the replay stamp on success.
    ///
    /// # Errors
    /// - `ReplayAttack` with `Expired`, `NonceReused` or `StaleEpoch`
    async fn verify_fragment(
        &self,
        envelope: &SignedEnvelope<MemoryFragment>,
    ) -> Result<EnvelopeVerification, SecurityError>;

    /// Read path. Requires the stamp to have been admitted previously.
    ///
    /// # Errors
    /// - `ReplayAttack` with `NotAdmitted`
    async fn verify_stored_fragment(
        &self,
        envelope: &SignedEnvelope<MemoryFragment>,
    ) -> Result<EnvelopeVerification, SecurityError>;

    fn resolve_provenance_chain(&self, content_hash: &str) -> Option<ProvenanceChain>;
}
