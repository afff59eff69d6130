//! # Forgery
//!
//! Envelopes altered after signing.

#[cfg(test)]
mod tests {
    use crate::fixtures::{caller, Harness};
    use mg_runtime::FragmentDraft;
    use shared_types::{put_json, MemoryFragment, Scope};

    #[tokio::test]
    async fn test_swapped_author_key_breaks_binding() {
        let h = Harness::new();
        let impostor = Harness::new();
        let mut signed = h
            .security
            .create_signed_fragment(MemoryFragment::new("f", "mine", 0.5, 0), vec![], None)
            .await
            .unwrap();
        signed.author.public_key = impostor.security.public_identity().unwrap().public_key;

        let verification = h.security.verify_fragment(&signed).await.unwrap();
        assert!(!verification.valid);
        assert!(!verification.checks.author_binding);
        assert!(!verification.checks.signature);
    }

    #[tokio::test]
    async fn test_claimed_identity_without_secret_fails_signature() {
        let h = Harness::new();
        let impostor = Harness::new();
        let mut signed = impostor
            .security
            .create_signed_fragment(MemoryFragment::new("f", "not yours", 0.5, 0), vec![], None)
            .await
            .unwrap();
        let victim = h.security.public_identity().unwrap();
        signed.author.fingerprint = victim.fingerprint;
        signed.author.public_key = victim.public_key;

        let verification = h.security.verify_fragment(&signed).await.unwrap();
        assert!(verification.checks.author_binding);
        assert!(!verification.checks.signature);
        assert!(!verification.valid);
    }

    #[tokio::test]
    async fn test_edited_payload_breaks_content_hash() {
        let h = Harness::new();
        let mut signed = h
            .security
            .create_signed_fragment(MemoryFragment::new("f", "pay 10", 0.5, 0), vec![], None)
            .await
            .unwrap();
        signed.payload.content = "pay 1000".into();

        let verification = h.security.verify_fragment(&signed).await.unwrap();
        assert!(!verification.valid);
        assert!(!verification.checks.content_hash);
        assert_eq!(verification.checks.first_failure(), Some("content_hash"));
        // An invalid envelope never consumes its nonce.
        let nonce = &signed.replay.as_ref().unwrap().nonce;
        assert!(
            !h.security
                .container()
                .replay
                .is_nonce_used(&signed.content_hash, nonce)
                .await
        );
    }

    #[tokio::test]
    async fn test_tampered_store_record_rejected_on_read() {
        let h = Harness::new();
        let field = h
            .fields
            .create_field("journal", Scope::User, vec![])
            .await
            .unwrap();
        let mut stored = h
            .fields
            .store_fragment(&field.id, FragmentDraft::new("original", 0.4), &caller())
            .await
            .unwrap();
        stored.payload.significance = 1.0;
        let path = format!("fields/{}/fragments/{}", field.id, stored.payload.id);
        put_json(h.store.as_ref(), &path, &stored).await.unwrap();

        let query = h.fields.query_field(&field.id, &caller()).await.unwrap();
        assert!(query.fragments.is_empty());
        assert_eq!(query.rejected.len(), 1);
    }
}
