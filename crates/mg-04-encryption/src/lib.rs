//! # Encryption Subsystem (MG-04)
//!
//! Selective encryption of private fragments for a bounded reader set.
//!
//! ## Scheme
//!
//! | Step | Primitive |
//! |------|-----------|
//! | Content key | fresh random 256-bit key per fragment |
//! | Body | XChaCha20-Poly1305, fresh 192-bit nonce |
//! | Key wrap (preferred) | secp256k1 ECDH -> BLAKE3 derive-key -> XChaCha20-Poly1305 |
//! | Key wrap (degraded) | `base64(key || BLAKE3(reader fingerprint))` |
//!
//! ## Security Notes
//!
//! - The degraded wrap offers **no confidentiality** against anyone holding the
//!   encrypted fragment. It exists for readers that publish no exchange key,
//!   is logged as a security event, and is refused under
//!   `KeyWrapPolicy::RequireEcdh`.
//! - Decryption authenticates the body before any plaintext is returned.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::entities::{
    EncryptedFragment, EncryptionConfig, KeyWrap, KeyWrapMethod, KeyWrapPolicy, ReaderKey,
};
pub use ports::inbound::EncryptionApi;
pub use service::EncryptionService;
