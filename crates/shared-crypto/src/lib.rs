//! # Shared Crypto - Memory Guard Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | XChaCha20-Poly1305 | Fragment and key-wrap encryption |
//! | `hashing` | BLAKE3 | Content hashes, fingerprints, key derivation |
//! | `signatures` | Ed25519 | Envelope and provenance signing |
//! | `exchange` | secp256k1 ECDH | Per-reader key agreement |
//! | `identity` | Ed25519 + secp256k1 | `IdentityProvider` backed by local keys |
//!
//! ## Security Properties
//!
//! - **XChaCha20**: 192-bit random nonce per message, never reused
//! - **Ed25519**: Deterministic nonces, no RNG dependency at signing time
//! - **ECDH**: Shared secret is never used directly; always passed through BLAKE3 derive-key
//! - **Secrets**: Symmetric keys zeroize on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod exchange;
pub mod hashing;
pub mod identity;
pub mod signatures;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use exchange::ExchangeKeyPair;
pub use hashing::{blake3_derive_key, blake3_hash, derive_fingerprint};
pub use identity::LocalIdentity;
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use symmetric::{decrypt, encrypt, open, seal, Nonce, SecretKey};
