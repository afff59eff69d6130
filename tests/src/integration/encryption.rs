//! # Encryption Between Actors
//!
//! Two independent security services exchanging an encrypted fragment.

#[cfg(test)]
mod tests {
    use crate::fixtures::Harness;
    use mg_04_encryption::{KeyWrapMethod, ReaderKey};
    use shared_types::{MemoryFragment, SecurityError};

    fn note() -> MemoryFragment {
        MemoryFragment::new("shared-field", "quarterly numbers look good", 0.7, 42)
            .with_id("note-1")
    }

    #[test]
    fn test_alice_encrypts_for_bob() {
        let alice = Harness::new();
        let bob = Harness::new();
        let bob_public = bob.security.public_identity().unwrap();

        let encrypted = alice
            .security
            .encrypt_fragment(&note(), &[ReaderKey::from(&bob_public)])
            .unwrap();
        let wrap = encrypted.wrap_for(&bob_public.fingerprint).unwrap();
        assert_eq!(wrap.method, KeyWrapMethod::Ecdh);

        let decrypted = bob
            .security
            .decrypt_fragment(&encrypted, &bob_public.fingerprint, None)
            .unwrap();
        assert_eq!(decrypted, note());

        let alice_exchange = alice.security.public_identity().unwrap().exchange_key;
        let explicit = bob
            .security
            .decrypt_fragment(&encrypted, &bob_public.fingerprint, alice_exchange.as_deref())
            .unwrap();
        assert_eq!(explicit, note());
    }

    #[test]
    fn test_third_party_cannot_decrypt() {
        let alice = Harness::new();
        let bob = Harness::new();
        let mallory = Harness::new();
        let bob_public = bob.security.public_identity().unwrap();
        let mallory_fp = mallory.security.public_identity().unwrap().fingerprint;

        let encrypted = alice
            .security
            .encrypt_fragment(&note(), &[ReaderKey::from(&bob_public)])
            .unwrap();

        let err = mallory
            .security
            .decrypt_fragment(&encrypted, &mallory_fp, None)
            .unwrap_err();
        assert!(matches!(err, SecurityError::Encryption(_)));

        // Claiming Bob's wrap does not help without Bob's exchange secret.
        let err = mallory
            .security
            .decrypt_fragment(&encrypted, &bob_public.fingerprint, None)
            .unwrap_err();
        assert!(matches!(err, SecurityError::Encryption(_)));
    }
}
