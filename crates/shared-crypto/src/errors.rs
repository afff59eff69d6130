//! Crypto error types.

use shared_types::{EncryptionFailure, SecurityError};
use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (authentication tag mismatch)
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Invalid nonce length
    #[error("Invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Expected nonce length in bytes
        expected: usize,
        /// Actual nonce length in bytes
        actual: usize,
    },

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid Ed25519 public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid or missing secp256k1 exchange key
    #[error("Invalid exchange key")]
    InvalidExchangeKey,
}

impl From<CryptoError> for SecurityError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::DecryptionFailed => {
                SecurityError::Encryption(EncryptionFailure::DecryptionFailed)
            }
            CryptoError::InvalidExchangeKey => {
                SecurityError::Encryption(EncryptionFailure::InvalidExchangeKey)
            }
            CryptoError::EncryptionFailed(reason) => {
                SecurityError::Encryption(EncryptionFailure::KeyWrapFailed(reason))
            }
            other => SecurityError::Internal(other.to_string()),
        }
    }
}
