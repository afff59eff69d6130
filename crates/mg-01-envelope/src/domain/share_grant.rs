//! # Share Grants
//!
//! Time-bounded delegation of capabilities on a field to another actor,
//! carried as a signed envelope.

use crate::domain::envelope::EnvelopeVerification;
use serde::{Deserialize, Serialize};
use shared_types::{FieldId, Fingerprint, Timestamp};

/// Schema name for share grants.
pub const SHARE_GRANT_SCHEMA: &str = "memory.share-grant";

/// Grant payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub grant_id: String,
    pub field_id: FieldId,
    pub grantor: Fingerprint,
    pub grantee: Fingerprint,
    pub capabilities: Vec<String>,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl ShareGrant {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of grant verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrantVerification {
    pub valid: bool,
    pub expired: bool,
    pub grantee_matches: bool,
    pub capabilities_allowed: bool,
    pub envelope: EnvelopeVerification,
}
