//! # Write Path
//!
//! Capability -> semantic floor -> entropy budget -> sign/admit -> persist.

#[cfg(test)]
mod tests {
    use crate::fixtures::{caller, Harness};
    use mg_01_envelope::ProvenanceOperation;
    use mg_02_semantic_validation::shannon_entropy;
    use mg_runtime::FragmentDraft;
    use shared_types::{Scope, SecurityError, HOUR_MS};
    use std::sync::Arc;

    /// 32 distinct characters, 5 bits of entropy.
    const FIVE_BITS: &str = "abcdefghijklmnopqrstuvwxyzABCDEF";

    #[tokio::test]
    async fn test_high_significance_low_entropy_global_vs_conversation() {
        let h = Harness::new();
        let global = h
            .fields
            .create_field("commons", Scope::Global, vec![])
            .await
            .unwrap();
        let chat = h
            .fields
            .create_field("chat", Scope::Conversation, vec![])
            .await
            .unwrap();
        let draft = FragmentDraft::new("aaaaaaaaaaaa", 0.9);

        let err = h
            .fields
            .store_fragment(&global.id, draft.clone(), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::Validation(_)));
        assert!(h.fields.fragment_ids(&global.id).await.unwrap().is_empty());

        let stored = h
            .fields
            .store_fragment(&chat.id, draft, &caller())
            .await
            .unwrap();
        assert_eq!(stored.payload.content, "aaaaaaaaaaaa");
    }

    #[tokio::test]
    async fn test_stored_fragment_has_created_provenance() {
        let h = Harness::new();
        let field = h
            .fields
            .create_field("journal", Scope::User, vec![])
            .await
            .unwrap();
        let stored = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new("first entry", 0.3), &caller())
            .await
            .unwrap();

        let chain = h
            .security
            .resolve_provenance_chain(&stored.content_hash)
            .unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.head().unwrap().operation, ProvenanceOperation::Created);
        assert_eq!(&chain.head().unwrap().actor, h.identity.fingerprint());
    }

    #[tokio::test]
    async fn test_entropy_cap_then_cooling() {
        let h = Harness::new();
        let field = h
            .fields
            .create_field("chat", Scope::Conversation, vec![])
            .await
            .unwrap();
        let per_write = shannon_entropy(FIVE_BITS);
        let fits = (500.0 / per_write).floor() as usize;

        for _ in 0..fits {
            h.fields
                .store_fragment(&field.id, FragmentDraft::new(FIVE_BITS, 0.5), &caller())
                .await
                .unwrap();
        }
        let err = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new(FIVE_BITS, 0.5), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::EntropyBudgetExceeded { .. }));

        let before = h.security.get_entropy_status(&field.id).unwrap().usage;
        h.clock.advance(HOUR_MS / 2);
        let after = h.security.get_entropy_status(&field.id).unwrap().usage;
        assert!(after < before);
        assert!((before - after - 25.0).abs() < 1e-9);

        h.fields
            .store_fragment(&field.id, FragmentDraft::new(FIVE_BITS, 0.5), &caller())
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_cannot_overshoot_budget() {
        let h = Arc::new(Harness::new());
        let field = h
            .fields
            .create_field("busy", Scope::Conversation, vec![])
            .await
            .unwrap();
        let fits = (500.0 / shannon_entropy(FIVE_BITS)).floor() as usize;

        let mut tasks = Vec::new();
        for _ in 0..fits + 20 {
            let h = h.clone();
            let field_id = field.id.clone();
            tasks.push(tokio::spawn(async move {
                h.fields
                    .store_fragment(&field_id, FragmentDraft::new(FIVE_BITS, 0.5), &caller())
                    .await
                    .is_ok()
            }));
        }
        let mut stored = 0;
        for task in tasks {
            if task.await.unwrap() {
                stored += 1;
            }
        }

        assert_eq!(stored, fits);
        assert!(h.security.get_entropy_status(&field.id).unwrap().usage <= 500.0);
        assert_eq!(h.fields.fragment_ids(&field.id).await.unwrap().len(), fits);
    }
}
