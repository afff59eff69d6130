//! # Fold
//!
//! Redacted, re-signed migration between fields.

#[cfg(test)]
mod tests {
    use crate::fixtures::{caller, Harness};
    use mg_01_envelope::ProvenanceOperation;
    use mg_02_semantic_validation::SemanticValidation;
    use mg_05_fold_redaction::{PrivacyPolicy, FOLD_SCHEMA};
    use mg_runtime::{FoldOptions, FragmentDraft, VALIDATION_KEY};
    use serde_json::json;
    use shared_types::{Scope, SecurityError};

    async fn seeded(h: &Harness) -> (String, String) {
        let f1 = h
            .fields
            .create_field("f1", Scope::User, vec![])
            .await
            .unwrap();
        let f2 = h
            .fields
            .create_field("f2", Scope::Organization, vec![])
            .await
            .unwrap();

        h.fields
            .store_fragment(&f2.id, FragmentDraft::new("already shared", 0.5), &caller())
            .await
            .unwrap();
        for content in ["already shared", "design notes", "meeting summary"] {
            let draft = FragmentDraft::new(content, 0.5)
                .with_metadata("conversation_id", json!("conv-1"))
                .with_metadata("author_id", json!("alice"))
                .with_metadata("device_id", json!("laptop"));
            h.fields.store_fragment(&f1.id, draft, &caller()).await.unwrap();
        }
        (f1.id, f2.id)
    }

    #[tokio::test]
    async fn test_fold_skips_duplicate_and_reports_entropy() {
        let h = Harness::new();
        let (f1, f2) = seeded(&h).await;
        let options = FoldOptions {
            verified_only: false,
            privacy: PrivacyPolicy::default(),
        };

        let result = h.fields.fold_fields(&f1, &f2, options, &caller()).await.unwrap();

        assert_eq!(result.synced_count, 2);
        assert_eq!(result.skipped_duplicates, 1);
        assert!(result.entropy_delta > 0.0);
        assert_eq!(result.operation.schema.name, FOLD_SCHEMA);
        assert_eq!(result.operation.payload.mappings.len(), 2);
        assert_eq!(h.fields.fragment_ids(&f2).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_folded_copies_are_redacted_verified_and_traced() {
        let h = Harness::new();
        let (f1, f2) = seeded(&h).await;

        let result = h
            .fields
            .fold_fields(&f1, &f2, FoldOptions::default(), &caller())
            .await
            .unwrap();
        assert_eq!(result.synced_count, 2);

        let query = h.fields.query_field(&f2, &caller()).await.unwrap();
        assert!(query.rejected.is_empty());
        let folded: Vec<_> = query
            .fragments
            .iter()
            .filter(|f| f.content != "already shared")
            .collect();
        assert_eq!(folded.len(), 2);
        for fragment in folded {
            assert!(!fragment.metadata.contains_key("author_id"));
            assert!(!fragment.metadata.contains_key("device_id"));
            let conversation = fragment.metadata["conversation_id"].as_str().unwrap();
            assert!(conversation.starts_with("redacted:"));
        }

        let mapping = &result.operation.payload.mappings[0];
        let chain = h.security.resolve_provenance_chain(&mapping.target_hash).unwrap();
        assert_eq!(chain.head().unwrap().operation, ProvenanceOperation::Folded);
        assert_eq!(
            chain.head().unwrap().previous_hash.as_deref(),
            Some(mapping.source_hash.as_str())
        );
        assert_eq!(chain.entries[0].operation, ProvenanceOperation::Created);
        assert_eq!(chain.entries[0].content_hash, mapping.source_hash);
        assert!(h.security.container().provenance.verify_signatures(&chain));
    }

    #[tokio::test]
    async fn test_folded_copy_scored_against_target_field() {
        let h = Harness::new();
        let source = h
            .fields
            .create_field("drafts", Scope::User, vec![1.0, 0.0])
            .await
            .unwrap();
        let target = h
            .fields
            .create_field("team", Scope::Organization, vec![0.0, 1.0])
            .await
            .unwrap();
        let original = h
            .fields
            .store_fragment(
                &source.id,
                FragmentDraft::new("roadmap for the next quarter", 0.5)
                    .with_prime_factors(vec![1.0, 0.0]),
                &caller(),
            )
            .await
            .unwrap();
        let scored_at_source: SemanticValidation =
            serde_json::from_value(original.payload.metadata[VALIDATION_KEY].clone()).unwrap();
        assert!((scored_at_source.prime_alignment - 1.0).abs() < 1e-12);

        let result = h
            .fields
            .fold_fields(&source.id, &target.id, FoldOptions::default(), &caller())
            .await
            .unwrap();
        assert_eq!(result.synced_count, 1);

        let query = h.fields.query_field(&target.id, &caller()).await.unwrap();
        assert_eq!(query.fragments.len(), 1);
        let scored_at_target: SemanticValidation =
            serde_json::from_value(query.fragments[0].metadata[VALIDATION_KEY].clone()).unwrap();
        assert!((scored_at_target.prime_alignment - 0.5).abs() < 1e-12);
        assert_eq!(
            scored_at_target.entropy_score.to_bits(),
            scored_at_source.entropy_score.to_bits()
        );
    }

    #[tokio::test]
    async fn test_fold_into_conversation_denied() {
        let h = Harness::new();
        let (f1, _) = seeded(&h).await;
        let chat = h
            .fields
            .create_field("chat", Scope::Conversation, vec![])
            .await
            .unwrap();

        let err = h
            .fields
            .fold_fields(&f1, &chat.id, FoldOptions::default(), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::CapabilityDenied { .. }));
        assert!(h.fields.fragment_ids(&chat.id).await.unwrap().is_empty());
    }
}
