use crate::domain::privacy::PrivacyPolicy;
use serde::{Deserialize, Serialize};
use shared_types::{FieldId, Fingerprint, FragmentId, Timestamp};

/// Schema name for fold operations.
pub const FOLD_SCHEMA: &str = "memory.fold";

/// Source fragment -> folded copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentMapping {
    pub source_fragment_id: FragmentId,
    pub target_fragment_id: FragmentId,
    pub source_hash: String,
    pub target_hash: String,
}

/// Signed description of one fold batch. Immutable once signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldOperation {
    pub source_field_id: FieldId,
    pub target_field_id: FieldId,
    pub mappings: Vec<FragmentMapping>,
    pub actor: Fingerprint,
    pub timestamp: Timestamp,
    pub privacy: PrivacyPolicy,
}
