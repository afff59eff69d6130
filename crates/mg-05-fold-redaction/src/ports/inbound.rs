use crate::domain::fold::{FoldOperation, FragmentMapping};
use crate::domain::privacy::PrivacyPolicy;
use mg_01_envelope::SignedEnvelope;
use shared_types::{FieldId, MemoryFragment, SecurityError};

pub trait FoldRedactionApi: Send + Sync {
    fn redact_fragment_for_fold(
        &self,
        fragment: &MemoryFragment,
        policy: &PrivacyPolicy,
    ) -> MemoryFragment;

    fn create_fold_operation(
        &self,
        source_field_id: FieldId,
        target_field_id: FieldId,
        mappings: Vec<FragmentMapping>,
        privacy: PrivacyPolicy,
    ) -> Result<SignedEnvelope<FoldOperation>, SecurityError>;
}
