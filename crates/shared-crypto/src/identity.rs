//! # Local Identity
//!
//! `IdentityProvider` backed by in-process Ed25519 and secp256k1 keys.

use crate::exchange::ExchangeKeyPair;
use crate::hashing::derive_fingerprint;
use crate::signatures::{verify_raw, Ed25519KeyPair};
use crate::symmetric::{open, seal};
use shared_types::{
    EncryptionFailure, Fingerprint, IdentityProvider, PublicIdentity, PublicKey, SecurityError,
    Signature,
};

/// A signing identity with an optional key-agreement key.
pub struct LocalIdentity {
    signing: Ed25519KeyPair,
    exchange: Option<ExchangeKeyPair>,
    fingerprint: Fingerprint,
}

impl LocalIdentity {
    /// Fresh signing and exchange keys.
    pub fn generate() -> Self {
        Self::from_parts(Ed25519KeyPair::generate(), Some(ExchangeKeyPair::generate()))
    }

    /// Fresh signing key without an exchange key. Readers of this identity
    /// can only receive degraded key-wraps.
    pub fn generate_signing_only() -> Self {
        Self::from_parts(Ed25519KeyPair::generate(), None)
    }

    /// Build from existing keys.
    pub fn from_parts(signing: Ed25519KeyPair, exchange: Option<ExchangeKeyPair>) -> Self {
        let fingerprint = derive_fingerprint(signing.public_key().as_bytes());
        Self {
            signing,
            exchange,
            fingerprint,
        }
    }

    /// Stable fingerprint of the signing key.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    fn exchange(&self) -> Result<&ExchangeKeyPair, SecurityError> {
        self.exchange
            .as_ref()
            .ok_or(SecurityError::Encryption(EncryptionFailure::InvalidExchangeKey))
    }
}

impl IdentityProvider for LocalIdentity {
    fn public_identity(&self) -> Option<PublicIdentity> {
        Some(PublicIdentity {
            fingerprint: self.fingerprint.clone(),
            public_key: *self.signing.public_key().as_bytes(),
            exchange_key: self.exchange.as_ref().map(ExchangeKeyPair::public_key_sec1),
        })
    }

    fn sign(&self, data: &[u8]) -> Result<Signature, SecurityError> {
        Ok(self.signing.sign(data).into())
    }

    fn verify(&self, data: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
        verify_raw(public_key, data, signature)
    }

    fn ecdh_encrypt(&self, plaintext: &[u8], peer_exchange_key: &[u8]) -> Result<Vec<u8>, SecurityError> {
        let key = self.exchange()?.wrap_key(peer_exchange_key)?;
        Ok(seal(&key, plaintext)?)
    }

    fn ecdh_decrypt(&self, ciphertext: &[u8], peer_exchange_key: &[u8]) -> Result<Vec<u8>, SecurityError> {
        let key = self.exchange()?.wrap_key(peer_exchange_key)?;
        Ok(open(&key, ciphertext)?)
    }
}
