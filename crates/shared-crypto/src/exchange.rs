//! # secp256k1 Key Agreement
//!
//! Static-static ECDH used to wrap per-fragment content keys for each reader.
//!
//! ## Security Properties
//!
//! - Peer keys are parsed as SEC1 points; off-curve input is rejected
//! - The raw shared secret is fed through BLAKE3 derive-key with a fixed
//!   context, so a wrap key is never the bare x-coordinate

use crate::hashing::blake3_derive_key;
use crate::symmetric::SecretKey;
use crate::CryptoError;
use k256::elliptic_curve::sec1::ToEncodedPoint;

/// Derive-key context for content-key wrapping.
pub const KEY_WRAP_CONTEXT: &str = "memory-guard key-wrap v1";

/// secp256k1 exchange keypair.
pub struct ExchangeKeyPair {
    secret: k256::SecretKey,
}

impl ExchangeKeyPair {
    /// Generate a random exchange keypair.
    pub fn generate() -> Self {
        Self {
            secret: k256::SecretKey::random(&mut rand::thread_rng()),
        }
    }

    /// Restore from 32 secret bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret = k256::SecretKey::from_slice(bytes).map_err(|_| CryptoError::InvalidExchangeKey)?;
        Ok(Self { secret })
    }

    /// Compressed SEC1 encoding of the public half.
    pub fn public_key_sec1(&self) -> Vec<u8> {
        self.secret
            .public_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    /// Derive the symmetric wrap key shared with `peer_sec1`.
    pub fn wrap_key(&self, peer_sec1: &[u8]) -> Result<SecretKey, CryptoError> {
        let peer =
            k256::PublicKey::from_sec1_bytes(peer_sec1).map_err(|_| CryptoError::InvalidExchangeKey)?;
        let shared = k256::ecdh::diffie_hellman(self.secret.to_nonzero_scalar(), peer.as_affine());
        Ok(SecretKey::from_bytes(blake3_derive_key(
            KEY_WRAP_CONTEXT,
            shared.raw_secret_bytes().as_slice(),
        )))
    }
}
