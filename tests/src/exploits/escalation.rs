//! # Capability Escalation
//!
//! Operations outside a scope's static table never reach the trust evaluator.

#[cfg(test)]
mod tests {
    use crate::fixtures::{caller, CountingEvaluator, Harness};
    use mg_runtime::{FoldOptions, MemoryGuardConfig};
    use shared_types::{CapabilityDecision, Fingerprint, Scope, SecurityError, TrustDecision, TrustEvaluator, DAY_MS};
    use std::sync::Arc;

    fn permissive() -> (Harness, Arc<CountingEvaluator>) {
        let evaluator = CountingEvaluator::new(TrustDecision::allow());
        let trust: Arc<dyn TrustEvaluator> = evaluator.clone();
        (Harness::with(MemoryGuardConfig::default(), Some(trust)), evaluator)
    }

    #[tokio::test]
    async fn test_admin_in_conversation_denied_without_consulting_evaluator() {
        let (h, evaluator) = permissive();
        let decision = h
            .security
            .check_memory_capability("memory:admin", Scope::Conversation, &caller())
            .await;
        assert_eq!(decision.decision, CapabilityDecision::Deny);
        assert_eq!(evaluator.calls(), 0);

        let decision = h
            .security
            .check_memory_capability("memory:admin", Scope::Organization, &caller())
            .await;
        assert_eq!(decision.decision, CapabilityDecision::Allow);
        assert_eq!(evaluator.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_capability_denied() {
        let (h, evaluator) = permissive();
        for scope in Scope::ALL {
            let decision = h
                .security
                .check_memory_capability("memory:root", scope, &caller())
                .await;
            assert_eq!(decision.decision, CapabilityDecision::Deny);
        }
        assert_eq!(evaluator.calls(), 0);
    }

    #[tokio::test]
    async fn test_confirm_blocks_writes() {
        let evaluator = CountingEvaluator::new(TrustDecision::confirm("ask the owner"));
        let trust: Arc<dyn TrustEvaluator> = evaluator.clone();
        let h = Harness::with(MemoryGuardConfig::default(), Some(trust));
        let field = h
            .fields
            .create_field("journal", Scope::User, vec![])
            .await
            .unwrap();

        let err = h
            .fields
            .store_fragment(&field.id, mg_runtime::FragmentDraft::new("hi", 0.2), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::CapabilityDenied { .. }));
        assert_eq!(evaluator.calls(), 1);
    }

    #[tokio::test]
    async fn test_fold_from_conversation_into_global_requires_global_fold() {
        let evaluator = CountingEvaluator::new(TrustDecision::deny("untrusted"));
        let trust: Arc<dyn TrustEvaluator> = evaluator.clone();
        let h = Harness::with(MemoryGuardConfig::default(), Some(trust));
        let chat = h
            .fields
            .create_field("chat", Scope::Conversation, vec![])
            .await
            .unwrap();
        let commons = h
            .fields
            .create_field("commons", Scope::Global, vec![])
            .await
            .unwrap();

        let err = h
            .fields
            .fold_fields(&chat.id, &commons.id, FoldOptions::default(), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, SecurityError::CapabilityDenied { .. }));
        assert!(h.fields.fragment_ids(&commons.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_share_grant_for_global_field_rejected() {
        let h = Harness::new();
        let grantee = Fingerprint::new("bob");
        let grant = h
            .security
            .create_share_grant("commons".into(), grantee.clone(), vec!["memory:share".into()], DAY_MS)
            .unwrap();

        let in_global = h
            .security
            .verify_share_grant(&grant, &grantee, Scope::Global)
            .unwrap();
        assert!(!in_global.valid);
        assert!(!in_global.capabilities_allowed);
        assert!(in_global.envelope.valid);

        let in_user = h.security.verify_share_grant(&grant, &grantee, Scope::User).unwrap();
        assert!(in_user.valid);
    }

    #[tokio::test]
    async fn test_share_grant_misuse() {
        let h = Harness::new();
        let grantee = Fingerprint::new("bob");
        let mut grant = h
            .security
            .create_share_grant("journal".into(), grantee.clone(), vec!["memory:read".into()], DAY_MS)
            .unwrap();

        let stolen = h
            .security
            .verify_share_grant(&grant, &Fingerprint::new("mallory"), Scope::User)
            .unwrap();
        assert!(!stolen.valid);
        assert!(!stolen.grantee_matches);

        h.clock.advance(DAY_MS);
        let expired = h.security.verify_share_grant(&grant, &grantee, Scope::User).unwrap();
        assert!(expired.expired);
        assert!(!expired.valid);

        grant.payload.capabilities.push("memory:admin".into());
        let widened = h.security.verify_share_grant(&grant, &grantee, Scope::User).unwrap();
        assert!(!widened.envelope.valid);
        assert!(!widened.valid);
    }
}
