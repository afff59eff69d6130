//! # Properties
//!
//! Invariants checked over generated inputs.

#[cfg(test)]
mod tests {
    use crate::fixtures::T0;
    use mg_01_envelope::{ReplayConfig, ReplayGuard, ReplayStamp};
    use mg_05_fold_redaction::{redact, PrivacyPolicy, ALWAYS_STRIPPED, PARTICIPANT_KEYS};
    use mg_07_gc_policy::{gc_policy, get_candidates};
    use mg_runtime::{MemoryGuardConfig, MemorySecurityService, SubsystemContainer};
    use proptest::prelude::*;
    use serde_json::json;
    use shared_crypto::LocalIdentity;
    use shared_types::{Fingerprint, InMemoryStore, ManualClock, MemoryFragment, Scope};
    use std::sync::Arc;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    fn security() -> MemorySecurityService {
        let container = SubsystemContainer::new(
            MemoryGuardConfig::default(),
            Arc::new(LocalIdentity::generate()),
            Arc::new(InMemoryStore::new()),
            Arc::new(ManualClock::new(T0)),
            None,
        );
        MemorySecurityService::new(Arc::new(container))
    }

    fn guard() -> ReplayGuard {
        ReplayGuard::new(
            ReplayConfig::default(),
            Arc::new(InMemoryStore::new()),
            Arc::new(ManualClock::new(T0)),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_signed_fragment_verifies(content in ".{0,200}", significance in 0.0f64..=1.0) {
            let rt = runtime();
            let security = security();
            let fragment = MemoryFragment::new("field", content, significance, T0);
            let verification = rt.block_on(async {
                let signed = security
                    .create_signed_fragment(fragment, vec!["memory:write".into()], None)
                    .await
                    .unwrap();
                security.verify_fragment(&signed).await.unwrap()
            });
            prop_assert!(verification.valid);
        }

        #[test]
        fn prop_epochs_strictly_increase(authors in prop::collection::vec(0u8..4, 1..40)) {
            let rt = runtime();
            let guard = guard();
            let mut last = std::collections::HashMap::new();
            rt.block_on(async {
                for author in authors {
                    let fingerprint = Fingerprint::new(format!("author-{author}"));
                    let epoch = guard.next_epoch(&fingerprint).await;
                    let previous = last.insert(author, epoch).unwrap_or(0);
                    assert!(epoch > previous);
                }
            });
        }

        #[test]
        fn prop_recorded_nonce_is_used(hash in "[0-9a-f]{64}", nonce in "[a-z0-9-]{8,36}") {
            let rt = runtime();
            let guard = guard();
            let stamp = ReplayStamp { epoch: 1, nonce: nonce.clone(), expires_at: T0 + 1_000 };
            let (before, after) = rt.block_on(async {
                let before = guard.is_nonce_used(&hash, &nonce).await;
                guard.record_nonce(&hash, &stamp).await;
                (before, guard.is_nonce_used(&hash, &nonce).await)
            });
            prop_assert!(!before);
            prop_assert!(after);
        }

        #[test]
        fn prop_redaction_strips_participants(
            values in prop::collection::vec("[a-z]{1,12}", 6),
            redact_timestamps in any::<bool>(),
        ) {
            let mut fragment = MemoryFragment::new("f", "content", 0.5, T0 + 12_345);
            for (key, value) in PARTICIPANT_KEYS.iter().chain(ALWAYS_STRIPPED.iter()).zip(&values) {
                fragment = fragment.with_metadata(*key, json!(value));
            }
            let policy = PrivacyPolicy::default().with_redact_timestamps(redact_timestamps);
            let redacted = redact(&fragment, &policy);
            for key in PARTICIPANT_KEYS.iter().chain(ALWAYS_STRIPPED.iter()) {
                prop_assert!(!redacted.metadata.contains_key(*key));
            }
            prop_assert_eq!(redacted.content, fragment.content);
        }

        #[test]
        fn prop_size_batch_is_exact_excess(extra in 0usize..20, missing in 0usize..5) {
            let cap = gc_policy(Scope::Conversation).max_fragments;
            let count = (cap + extra).saturating_sub(missing);
            let fragments: Vec<MemoryFragment> = (0..count)
                .map(|i| MemoryFragment::new("f", "x", 0.5, T0).with_id(format!("frag-{i:05}")))
                .collect();
            let candidates = get_candidates(&fragments, Scope::Conversation, T0);
            prop_assert_eq!(candidates.size.len(), count.saturating_sub(cap));
        }
    }
}
