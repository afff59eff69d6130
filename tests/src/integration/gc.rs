//! # Garbage Collection
//!
//! Policy deletions applied to a stored field.

#[cfg(test)]
mod tests {
    use crate::fixtures::{caller, Harness};
    use mg_07_gc_policy::GcReason;
    use mg_runtime::FragmentDraft;
    use shared_types::{Scope, DAY_MS, HOUR_MS};

    #[tokio::test]
    async fn test_collect_garbage_drops_old_insignificant_fragments() {
        let h = Harness::new();
        let field = h
            .fields
            .create_field("chat", Scope::Conversation, vec![])
            .await
            .unwrap();

        let stale = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new("small talk", 0.1), &caller())
            .await
            .unwrap();
        let kept = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new("deploy on friday", 0.6), &caller())
            .await
            .unwrap();
        h.clock.advance(DAY_MS + HOUR_MS);
        let fresh = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new("more small talk", 0.1), &caller())
            .await
            .unwrap();

        let now = h.security.now();
        let fragments = vec![
            stale.payload.clone(),
            kept.payload.clone(),
            fresh.payload.clone(),
        ];
        let candidates = h
            .security
            .get_gc_candidates(&fragments, Scope::Conversation, now);
        let reasons: Vec<GcReason> = candidates.policy.iter().map(|c| c.reason).collect();
        assert_eq!(
            reasons,
            vec![
                GcReason::LowSignificance,
                GcReason::Significant,
                GcReason::WithinRetention
            ]
        );

        let plan = h.fields.collect_garbage(&field.id, now).await.unwrap();
        assert_eq!(plan.deleted, vec![stale.payload.id.clone()]);
        assert_eq!(plan.policy_deletions, 1);
        assert_eq!(plan.freed_bytes, stale.payload.size_bytes());

        let ids = h.fields.fragment_ids(&field.id).await.unwrap();
        assert_eq!(ids, vec![kept.payload.id.clone(), fresh.payload.id.clone()]);
        let query = h.fields.query_field(&field.id, &caller()).await.unwrap();
        assert_eq!(query.fragments.len(), 2);
        assert!(query.rejected.is_empty());
    }

    #[tokio::test]
    async fn test_collect_garbage_is_idempotent() {
        let h = Harness::new();
        let field = h
            .fields
            .create_field("chat", Scope::Conversation, vec![])
            .await
            .unwrap();
        h.fields
            .store_fragment(&field.id, FragmentDraft::new("ephemeral", 0.05), &caller())
            .await
            .unwrap();
        h.clock.advance(2 * DAY_MS);

        let now = h.security.now();
        let first = h.fields.collect_garbage(&field.id, now).await.unwrap();
        let second = h.fields.collect_garbage(&field.id, now).await.unwrap();
        assert_eq!(first.deleted.len(), 1);
        assert!(second.deleted.is_empty());
        assert!(h.fields.fragment_ids(&field.id).await.unwrap().is_empty());
    }
}
