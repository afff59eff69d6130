//! # Memory Field Service
//!
//! Reference consumer of [`MemorySecurityService`]: fields and fragments
//! persisted through the store port, with every write, read, fold and
//! collection routed through the security checks.
//!
//! ## Store Layout
//!
//! | Path | Record |
//! |------|--------|
//! | `fields/{field_id}` | `MemoryField` |
//! | `fields/{field_id}/index` | fragment ids, insertion order |
//! | `fields/{field_id}/fragments/{fragment_id}` | signed fragment envelope |
//! | `folds/{target_field_id}/{operation_id}` | signed fold operation |
//!
//! ## Concurrency
//!
//! Writes to a field hold that field's async mutex from the capability check
//! through the entropy commit, so two writers cannot both pass the budget
//! check before either consumes. Folds lock both fields in id order.

use crate::security::MemorySecurityService;
use mg_01_envelope::SignedEnvelope;
use mg_03_capability_gate::MemoryOperation;
use mg_05_fold_redaction::{FoldOperation, FragmentMapping, PrivacyPolicy};
use mg_07_gc_policy::GcPlan;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::{
    get_json, put_json, FieldId, FragmentId, MemoryField, MemoryFragment, PersistentStore, Scope,
    SecurityError, Timestamp, TrustAssessment,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

type StoredFragment = SignedEnvelope<MemoryFragment>;

/// Metadata key holding the semantic scores computed against the owning field.
pub const VALIDATION_KEY: &str = "validation";

fn field_path(field_id: &str) -> String {
    format!("fields/{field_id}")
}

fn index_path(field_id: &str) -> String {
    format!("fields/{field_id}/index")
}

fn fragment_path(field_id: &str, fragment_id: &str) -> String {
    format!("fields/{field_id}/fragments/{fragment_id}")
}

fn fold_path(target_field_id: &str, operation_id: &str) -> String {
    format!("folds/{target_field_id}/{operation_id}")
}

/// Caller-supplied part of a new fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentDraft {
    pub content: String,
    pub significance: f64,
    #[serde(default)]
    pub prime_factors: Vec<f64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl FragmentDraft {
    pub fn new(content: impl Into<String>, significance: f64) -> Self {
        Self {
            content: content.into(),
            significance,
            prime_factors: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_prime_factors(mut self, factors: Vec<f64>) -> Self {
        self.prime_factors = factors;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedFragment {
    pub fragment_id: FragmentId,
    pub error: SecurityError,
}

/// Fragments that passed verification, plus per-fragment failures.
/// Global-scope queries never report failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldQuery {
    pub fragments: Vec<MemoryFragment>,
    pub rejected: Vec<RejectedFragment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldOptions {
    /// Skip source fragments that fail read-path verification.
    pub verified_only: bool,
    pub privacy: PrivacyPolicy,
}

impl Default for FoldOptions {
    fn default() -> Self {
        Self {
            verified_only: true,
            privacy: PrivacyPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult {
    pub synced_count: usize,
    pub skipped_duplicates: usize,
    pub skipped_unverified: usize,
    /// Refused by the target scope's semantic floor or entropy budget.
    pub skipped_rejected: usize,
    /// Entropy committed to the target field.
    pub entropy_delta: f64,
    pub operation: SignedEnvelope<FoldOperation>,
}

pub struct MemoryFieldService {
    security: Arc<MemorySecurityService>,
    locks: Mutex<HashMap<FieldId, Arc<AsyncMutex<()>>>>,
}

impl MemoryFieldService {
    pub fn new(security: Arc<MemorySecurityService>) -> Self {
        Self {
            security,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn security(&self) -> &Arc<MemorySecurityService> {
        &self.security
    }

    fn store(&self) -> &dyn PersistentStore {
        self.security.container().store.as_ref()
    }

    fn field_lock(&self, field_id: &str) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .entry(field_id.to_string())
            .or_default()
            .clone()
    }

    // =========================================================================
    // FIELDS
    // =========================================================================

    pub async fn create_field(
        &self,
        name: impl Into<String>,
        scope: Scope,
        signature: Vec<f64>,
    ) -> Result<MemoryField, SecurityError> {
        if signature.iter().any(|x| !x.is_finite()) {
            return Err(SecurityError::Validation(
                "field signature must be finite".into(),
            ));
        }
        let field = MemoryField {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            scope,
            signature,
            created_at: self.security.now(),
        };
        put_json(self.store(), &field_path(&field.id), &field).await?;
        put_json(self.store(), &index_path(&field.id), &Vec::<FragmentId>::new()).await?;
        info!(field_id = %field.id, scope = %scope, name = %field.name, "Field created");
        Ok(field)
    }

    pub async fn get_field(&self, field_id: &str) -> Result<MemoryField, SecurityError> {
        get_json(self.store(), &field_path(field_id))
            .await?
            .ok_or_else(|| SecurityError::NotFound(format!("field {field_id}")))
    }

    pub async fn fragment_ids(&self, field_id: &str) -> Result<Vec<FragmentId>, SecurityError> {
        Ok(get_json(self.store(), &index_path(field_id))
            .await?
            .unwrap_or_default())
    }

    async fn save_index(&self, field_id: &str, index: &[FragmentId]) -> Result<(), SecurityError> {
        Ok(put_json(self.store(), &index_path(field_id), &index).await?)
    }

    async fn load_entries(
        &self,
        field_id: &str,
    ) -> Result<Vec<(FragmentId, Option<StoredFragment>)>, SecurityError> {
        let mut entries = Vec::new();
        for fragment_id in self.fragment_ids(field_id).await? {
            let stored = get_json(self.store(), &fragment_path(field_id, &fragment_id)).await?;
            entries.push((fragment_id, stored));
        }
        Ok(entries)
    }

    // =========================================================================
    // WRITE PATH
    // =========================================================================

    /// Capability, semantic floor, entropy budget, sign, admit, persist,
    /// then commit entropy.
    pub async fn store_fragment(
        &self,
        field_id: &str,
        draft: FragmentDraft,
        trust: &TrustAssessment,
    ) -> Result<StoredFragment, SecurityError> {
        let field = self.get_field(field_id).await?;
        let lock = self.field_lock(field_id);
        let _guard = lock.lock().await;

        let capability = MemoryOperation::Write.capability();
        self.security
            .require_capability(&capability, field.scope, trust)
            .await?;

        let mut fragment = MemoryFragment::new(
            field_id,
            draft.content,
            draft.significance,
            self.security.now(),
        )
        .with_prime_factors(draft.prime_factors);
        fragment.metadata = draft.metadata;

        let validation = self
            .security
            .validate_semantics(&fragment, &field.signature, field.scope)?;
        fragment
            .metadata
            .insert(VALIDATION_KEY.to_string(), serde_json::to_value(validation)?);

        let entropy = validation.entropy_score;
        let budget = self
            .security
            .check_entropy_budget(field_id, field.scope, entropy);
        if !budget.allowed {
            return Err(SecurityError::EntropyBudgetExceeded {
                field_id: field_id.to_string(),
                reason: budget.reason.unwrap_or_default(),
            });
        }

        let envelope = self
            .security
            .create_signed_fragment(fragment, vec![capability], None)
            .await?;
        self.admit(&envelope).await?;
        self.persist(field_id, &envelope).await?;
        self.security.consume_entropy(field_id, entropy)?;

        debug!(
            field_id,
            fragment_id = %envelope.payload.id,
            content_hash = %envelope.content_hash,
            entropy,
            "Fragment stored"
        );
        Ok(envelope)
    }

    async fn admit(&self, envelope: &StoredFragment) -> Result<(), SecurityError> {
        let verification = self.security.verify_fragment(envelope).await?;
        if verification.valid {
            Ok(())
        } else {
            Err(SecurityError::Internal(format!(
                "freshly signed fragment failed verification: {}",
                verification.error.unwrap_or_default()
            )))
        }
    }

    async fn persist(&self, field_id: &str, envelope: &StoredFragment) -> Result<(), SecurityError> {
        let fragment_id = &envelope.payload.id;
        put_json(self.store(), &fragment_path(field_id, fragment_id), envelope).await?;
        let mut index = self.fragment_ids(field_id).await?;
        index.push(fragment_id.clone());
        self.save_index(field_id, &index).await
    }

    // =========================================================================
    // READ PATH
    // =========================================================================

    /// Verify every stored fragment of the field. In global scope invalid
    /// fragments are dropped from the result instead of reported.
    pub async fn query_field(
        &self,
        field_id: &str,
        trust: &TrustAssessment,
    ) -> Result<FieldQuery, SecurityError> {
        let field = self.get_field(field_id).await?;
        self.security
            .require_capability(&MemoryOperation::Read.capability(), field.scope, trust)
            .await?;

        let mut query = FieldQuery::default();
        for (fragment_id, stored) in self.load_entries(field_id).await? {
            let outcome = match &stored {
                None => Err(SecurityError::NotFound(format!("fragment {fragment_id}"))),
                Some(envelope) => match self.security.verify_stored_fragment(envelope).await {
                    Ok(v) if v.valid => Ok(()),
                    Ok(v) => Err(SecurityError::Validation(
                        v.error.unwrap_or_else(|| "invalid envelope".into()),
                    )),
                    Err(e) => Err(e),
                },
            };

            match (outcome, stored) {
                (Ok(()), Some(envelope)) => query.fragments.push(envelope.payload),
                (Err(error), _) if field.scope == Scope::Global => {
                    warn!(
                        security_event = "global_exclusion",
                        field_id,
                        fragment_id = %fragment_id,
                        error = %error,
                        "Unverifiable fragment excluded from global query"
                    );
                }
                (Err(error), _) => query.rejected.push(RejectedFragment { fragment_id, error }),
                (Ok(()), None) => {}
            }
        }
        query.fragments.sort_by_key(|f| f.timestamp);
        Ok(query)
    }

    // =========================================================================
    // FOLD
    // =========================================================================

    /// Copy redacted fragments of `source_id` into `target_id`.
    pub async fn fold_fields(
        &self,
        source_id: &str,
        target_id: &str,
        options: FoldOptions,
        trust: &TrustAssessment,
    ) -> Result<FoldResult, SecurityError> {
        if source_id == target_id {
            return Err(SecurityError::Validation(format!(
                "cannot fold field {source_id} into itself"
            )));
        }
        let source = self.get_field(source_id).await?;
        let target = self.get_field(target_id).await?;

        let (first, second) = if source_id < target_id {
            (source_id, target_id)
        } else {
            (target_id, source_id)
        };
        let first_lock = self.field_lock(first);
        let second_lock = self.field_lock(second);
        let _first = first_lock.lock().await;
        let _second = second_lock.lock().await;

        let capability = MemoryOperation::Fold.capability();
        self.security
            .require_capability(&capability, target.scope, trust)
            .await?;

        let mut target_contents: HashSet<String> = self
            .load_entries(target_id)
            .await?
            .into_iter()
            .filter_map(|(_, stored)| stored.map(|e| e.payload.content))
            .collect();

        let mut mappings = Vec::new();
        let mut skipped_duplicates = 0;
        let mut skipped_unverified = 0;
        let mut skipped_rejected = 0;
        let mut entropy_delta = 0.0;

        for (fragment_id, stored) in self.load_entries(source_id).await? {
            let Some(envelope) = stored else {
                skipped_unverified += 1;
                continue;
            };
            if options.verified_only && !self.is_verified(&envelope).await {
                skipped_unverified += 1;
                continue;
            }

            let mut copy = self
                .security
                .redact_fragment_for_fold(&envelope.payload, &options.privacy);
            if target_contents.contains(&copy.content) {
                skipped_duplicates += 1;
                continue;
            }
            copy.id = uuid::Uuid::new_v4().to_string();
            copy.field_id = target.id.clone();

            copy.metadata.remove(VALIDATION_KEY);
            let validation = match self
                .security
                .validate_semantics(&copy, &target.signature, target.scope)
            {
                Ok(validation) => validation,
                Err(e) => {
                    debug!(fragment_id = %fragment_id, error = %e, "Fold copy rejected by target scope");
                    skipped_rejected += 1;
                    continue;
                }
            };
            copy.metadata
                .insert(VALIDATION_KEY.to_string(), serde_json::to_value(validation)?);
            let entropy = validation.entropy_score;
            if !self
                .security
                .check_entropy_budget(target_id, target.scope, entropy)
                .allowed
            {
                skipped_rejected += 1;
                continue;
            }

            let signed = self
                .security
                .create_signed_fragment(copy, vec![capability.clone()], None)
                .await?;
            self.admit(&signed).await?;
            self.security.record_fold_provenance(
                &envelope.content_hash,
                &signed.content_hash,
                options.privacy.preserve_provenance,
            )?;
            self.persist(target_id, &signed).await?;
            self.security.consume_entropy(target_id, entropy)?;

            entropy_delta += entropy;
            target_contents.insert(signed.payload.content.clone());
            mappings.push(FragmentMapping {
                source_fragment_id: fragment_id,
                target_fragment_id: signed.payload.id.clone(),
                source_hash: envelope.content_hash.clone(),
                target_hash: signed.content_hash.clone(),
            });
        }

        let synced_count = mappings.len();
        let operation = self.security.create_fold_operation(
            source.id.clone(),
            target.id.clone(),
            mappings,
            options.privacy,
        )?;
        let operation_id = uuid::Uuid::new_v4().to_string();
        put_json(self.store(), &fold_path(target_id, &operation_id), &operation).await?;

        info!(
            source = %source.id,
            target = %target.id,
            synced_count,
            skipped_duplicates,
            skipped_unverified,
            skipped_rejected,
            entropy_delta,
            "Fold completed"
        );

        Ok(FoldResult {
            synced_count,
            skipped_duplicates,
            skipped_unverified,
            skipped_rejected,
            entropy_delta,
            operation,
        })
    }

    async fn is_verified(&self, envelope: &StoredFragment) -> bool {
        matches!(
            self.security.verify_stored_fragment(envelope).await,
            Ok(verification) if verification.valid
        )
    }

    // =========================================================================
    // GARBAGE COLLECTION
    // =========================================================================

    /// Apply the scope's GC plan to the field as of `now`.
    pub async fn collect_garbage(
        &self,
        field_id: &str,
        now: Timestamp,
    ) -> Result<GcPlan, SecurityError> {
        let field = self.get_field(field_id).await?;
        let lock = self.field_lock(field_id);
        let _guard = lock.lock().await;

        let fragments: Vec<MemoryFragment> = self
            .load_entries(field_id)
            .await?
            .into_iter()
            .filter_map(|(_, stored)| stored.map(|e| e.payload))
            .collect();

        let plan = self.security.perform_gc(&fragments, field.scope, now);
        for fragment_id in &plan.deleted {
            self.store()
                .delete(&fragment_path(field_id, fragment_id))
                .await?;
        }

        let deleted: HashSet<&FragmentId> = plan.deleted.iter().collect();
        let index: Vec<FragmentId> = self
            .fragment_ids(field_id)
            .await?
            .into_iter()
            .filter(|id| !deleted.contains(id))
            .collect();
        self.save_index(field_id, &index).await?;

        let remaining_bytes: u64 = fragments
            .iter()
            .filter(|f| !deleted.contains(&f.id))
            .map(MemoryFragment::size_bytes)
            .sum();
        self.security.check_storage_quota(field.scope, remaining_bytes);

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{MemoryGuardConfig, SubsystemContainer};
    use async_trait::async_trait;
    use shared_crypto::LocalIdentity;
    use shared_types::{
        Fingerprint, InMemoryStore, ManualClock, TrustDecision, TrustEvaluator, DAY_MS,
    };

    struct DenyWrites;

    #[async_trait]
    impl TrustEvaluator for DenyWrites {
        async fn check_capability(
            &self,
            capability: &str,
            _trust: &TrustAssessment,
        ) -> Result<TrustDecision, SecurityError> {
            Ok(if capability == "memory:write" {
                TrustDecision::deny("read-only caller")
            } else {
                TrustDecision::allow()
            })
        }
    }

    struct Harness {
        fields: MemoryFieldService,
        store: Arc<InMemoryStore>,
        clock: Arc<ManualClock>,
    }

    fn harness(trust: Option<Arc<dyn TrustEvaluator>>) -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(10 * DAY_MS));
        let container = SubsystemContainer::new(
            MemoryGuardConfig::default(),
            Arc::new(LocalIdentity::generate()),
            store.clone(),
            clock.clone(),
            trust,
        );
        let security = Arc::new(MemorySecurityService::new(Arc::new(container)));
        Harness {
            fields: MemoryFieldService::new(security),
            store,
            clock,
        }
    }

    fn caller() -> TrustAssessment {
        TrustAssessment::new(Fingerprint::new("caller"), 0.8)
    }

    async fn tamper(store: &InMemoryStore, field_id: &str, fragment_id: &str) {
        let path = fragment_path(field_id, fragment_id);
        let mut stored: StoredFragment = get_json(store, &path).await.unwrap().unwrap();
        stored.payload.content.push_str(" (edited)");
        put_json(store, &path, &stored).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_and_query() {
        let h = harness(None);
        let field = h
            .fields
            .create_field("notes", Scope::Conversation, vec![1.0, 0.0])
            .await
            .unwrap();

        let stored = h
            .fields
            .store_fragment(
                &field.id,
                FragmentDraft::new("remember the milk", 0.4).with_prime_factors(vec![1.0, 0.0]),
                &caller(),
            )
            .await
            .unwrap();
        assert!(stored.payload.metadata.contains_key("validation"));
        assert!(h.store.contains(&fragment_path(&field.id, &stored.payload.id)));

        let query = h.fields.query_field(&field.id, &caller()).await.unwrap();
        assert_eq!(query.fragments, vec![stored.payload]);
        assert!(query.rejected.is_empty());

        let status = h.fields.security().get_entropy_status(&field.id).unwrap();
        assert!(status.usage > 0.0);
    }

    #[tokio::test]
    async fn test_tampered_fragment_reported_outside_global() {
        let h = harness(None);
        let field = h
            .fields
            .create_field("private", Scope::User, vec![])
            .await
            .unwrap();
        let stored = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new("original text", 0.2), &caller())
            .await
            .unwrap();
        tamper(&h.store, &field.id, &stored.payload.id).await;

        let query = h.fields.query_field(&field.id, &caller()).await.unwrap();
        assert!(query.fragments.is_empty());
        assert_eq!(query.rejected.len(), 1);
        assert_eq!(query.rejected[0].fragment_id, stored.payload.id);
    }

    #[tokio::test]
    async fn test_tampered_fragment_silently_excluded_in_global() {
        let h = harness(None);
        let field = h
            .fields
            .create_field("commons", Scope::Global, vec![])
            .await
            .unwrap();
        let keep = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new("shared fact one", 0.2), &caller())
            .await
            .unwrap();
        h.clock.advance(1);
        let bad = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new("shared fact two", 0.2), &caller())
            .await
            .unwrap();
        tamper(&h.store, &field.id, &bad.payload.id).await;

        let query = h.fields.query_field(&field.id, &caller()).await.unwrap();
        assert_eq!(query.fragments, vec![keep.payload]);
        assert!(query.rejected.is_empty());
    }

    #[tokio::test]
    async fn test_untampered_fragments_verify_after_reload() {
        let contents = [
            "shared fact one",
            "the quick brown fox jumps over the lazy dog",
            "0.1 + 0.2 != 0.3",
            "ÄÖÜ äöü ß",
            "ratios: 1/3 2/7 5/11",
        ];
        for round in 0..8u32 {
            let h = harness(None);
            let field = h
                .fields
                .create_field("facts", Scope::User, vec![0.3, 0.7, 0.1])
                .await
                .unwrap();
            let mut stored = Vec::new();
            for (i, content) in contents.iter().enumerate() {
                let significance = (round as f64 + 1.0) / (i as f64 + 10.0);
                let draft = FragmentDraft::new(*content, significance)
                    .with_prime_factors(vec![1.0 / (i as f64 + 3.0), 0.1 * round as f64, 2.0 / 3.0]);
                stored.push(h.fields.store_fragment(&field.id, draft, &caller()).await.unwrap());
                h.clock.advance(1);
            }

            let query = h.fields.query_field(&field.id, &caller()).await.unwrap();
            assert!(query.rejected.is_empty(), "round {round}: {:?}", query.rejected);
            assert_eq!(query.fragments.len(), contents.len());
            for envelope in &stored {
                let path = fragment_path(&field.id, &envelope.payload.id);
                let reloaded: StoredFragment = get_json(h.store.as_ref(), &path).await.unwrap().unwrap();
                assert_eq!(reloaded.content_hash, envelope.content_hash);
            }
        }
    }

    #[tokio::test]
    async fn test_denied_write_persists_nothing() {
        let h = harness(Some(Arc::new(DenyWrites)));
        let field = h
            .fields
            .create_field("locked", Scope::User, vec![])
            .await
            .unwrap();

        let err = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new("nope", 0.5), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::CapabilityDenied { .. }));
        assert!(h.fields.fragment_ids(&field.id).await.unwrap().is_empty());
        assert!(h.fields.security().get_entropy_status(&field.id).is_none());
    }

    #[tokio::test]
    async fn test_fragment_over_entropy_limit_rejected() {
        let h = harness(None);
        let field = h
            .fields
            .create_field("chat", Scope::Conversation, vec![])
            .await
            .unwrap();
        let noisy: String = (0..100u32).filter_map(|i| char::from_u32(0x4E00 + i)).collect();

        let err = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new(noisy, 0.5), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::EntropyBudgetExceeded { .. }));
        assert!(h.fields.fragment_ids(&field.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_field() {
        let h = harness(None);
        assert!(matches!(
            h.fields.get_field("nope").await,
            Err(SecurityError::NotFound(_))
        ));
    }
}
