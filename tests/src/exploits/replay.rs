//! # Replay
//!
//! Resubmitted, reordered, expired and never-admitted envelopes.

#[cfg(test)]
mod tests {
    use crate::fixtures::{caller, Harness};
    use mg_runtime::FragmentDraft;
    use shared_types::{put_json, MemoryFragment, ReplayReason, Scope};

    fn fragment(content: &str) -> MemoryFragment {
        MemoryFragment::new("field-x", content, 0.4, 0)
    }

    #[tokio::test]
    async fn test_resubmitted_envelope_rejected() {
        let h = Harness::new();
        let signed = h
            .security
            .create_signed_fragment(fragment("once"), vec!["memory:write".into()], None)
            .await
            .unwrap();

        assert!(h.security.verify_fragment(&signed).await.unwrap().valid);
        let err = h.security.verify_fragment(&signed).await.unwrap_err();
        assert_eq!(err.replay_reason(), Some(ReplayReason::NonceReused));
    }

    #[tokio::test]
    async fn test_out_of_order_delivery_rejected() {
        let h = Harness::new();
        let first = h
            .security
            .create_signed_fragment(fragment("a"), vec![], None)
            .await
            .unwrap();
        let second = h
            .security
            .create_signed_fragment(fragment("b"), vec![], None)
            .await
            .unwrap();

        h.security.verify_fragment(&second).await.unwrap();
        let err = h.security.verify_fragment(&first).await.unwrap_err();
        assert_eq!(err.replay_reason(), Some(ReplayReason::StaleEpoch));
    }

    #[tokio::test]
    async fn test_expired_stamp_rejected() {
        let h = Harness::new();
        let signed = h
            .security
            .create_signed_fragment(fragment("late"), vec![], None)
            .await
            .unwrap();
        let ttl = h.security.container().replay.config().nonce_ttl_ms;
        h.clock.advance(ttl + 1);

        let err = h.security.verify_fragment(&signed).await.unwrap_err();
        assert_eq!(err.replay_reason(), Some(ReplayReason::Expired));
    }

    #[tokio::test]
    async fn test_expired_and_reused_reports_expiry_first() {
        let h = Harness::new();
        let signed = h
            .security
            .create_signed_fragment(fragment("both"), vec![], None)
            .await
            .unwrap();
        h.security.verify_fragment(&signed).await.unwrap();
        let ttl = h.security.container().replay.config().nonce_ttl_ms;
        h.clock.advance(ttl + 1);

        let err = h.security.verify_fragment(&signed).await.unwrap_err();
        assert_eq!(err.replay_reason(), Some(ReplayReason::Expired));
    }

    #[tokio::test]
    async fn test_injected_unadmitted_fragment_reported_on_read() {
        let h = Harness::new();
        let field = h
            .fields
            .create_field("journal", Scope::User, vec![])
            .await
            .unwrap();
        let honest = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new("real entry", 0.4), &caller())
            .await
            .unwrap();

        // Validly signed, but written straight to storage without admission.
        let smuggled = h
            .security
            .create_signed_fragment(
                MemoryFragment::new(field.id.clone(), "smuggled entry", 0.4, 0).with_id("smuggled"),
                vec!["memory:write".into()],
                None,
            )
            .await
            .unwrap();
        let store = h.store.as_ref();
        put_json(store, &format!("fields/{}/fragments/smuggled", field.id), &smuggled)
            .await
            .unwrap();
        let index = vec![honest.payload.id.clone(), "smuggled".to_string()];
        put_json(store, &format!("fields/{}/index", field.id), &index)
            .await
            .unwrap();

        let query = h.fields.query_field(&field.id, &caller()).await.unwrap();
        assert_eq!(query.fragments.len(), 1);
        assert_eq!(query.fragments[0].content, "real entry");
        assert_eq!(query.rejected.len(), 1);
        assert_eq!(query.rejected[0].fragment_id, "smuggled");
        assert_eq!(
            query.rejected[0].error.replay_reason(),
            Some(ReplayReason::NotAdmitted)
        );
    }

    #[tokio::test]
    async fn test_epochs_survive_restart_on_shared_store() {
        let h = Harness::new();
        let signed = h
            .security
            .create_signed_fragment(fragment("before restart"), vec![], None)
            .await
            .unwrap();
        h.security.verify_fragment(&signed).await.unwrap();

        // Same identity, same store, fresh in-memory state.
        let restarted = Harness::with_store(&h);
        let err = restarted.security.verify_fragment(&signed).await.unwrap_err();
        assert_eq!(err.replay_reason(), Some(ReplayReason::NonceReused));

        let next = restarted
            .security
            .create_signed_fragment(fragment("after restart"), vec![], None)
            .await
            .unwrap();
        assert!(next.replay.as_ref().unwrap().epoch > signed.replay.as_ref().unwrap().epoch);
        assert!(restarted.security.verify_fragment(&next).await.unwrap().valid);
    }
}
