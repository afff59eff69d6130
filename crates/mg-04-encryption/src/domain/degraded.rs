//! Degraded key wrap: `key || BLAKE3(reader fingerprint)`.
//!
//! Binds the key to a reader but does not hide it.

use shared_crypto::{blake3_hash, SecretKey};
use shared_types::{EncryptionFailure, Fingerprint};

const KEY_LEN: usize = 32;
const BINDING_LEN: usize = 32;

pub fn wrap(key: &SecretKey, reader: &Fingerprint) -> Vec<u8> {
    let mut out = Vec::with_capacity(KEY_LEN + BINDING_LEN);
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(&blake3_hash(reader.as_str().as_bytes()));
    out
}

pub fn unwrap(wrapped: &[u8], reader: &Fingerprint) -> Result<SecretKey, EncryptionFailure> {
    if wrapped.len() != KEY_LEN + BINDING_LEN {
        return Err(EncryptionFailure::KeyWrapFailed(format!(
            "degraded wrap must be {} bytes, got {}",
            KEY_LEN + BINDING_LEN,
            wrapped.len()
        )));
    }
    let (key, binding) = wrapped.split_at(KEY_LEN);
    if binding != blake3_hash(reader.as_str().as_bytes()).as_slice() {
        return Err(EncryptionFailure::KeyWrapFailed(
            "degraded wrap bound to another reader".into(),
        ));
    }
    let mut bytes = [0u8; KEY_LEN];
    bytes.copy_from_slice(key);
    Ok(SecretKey::from_bytes(bytes))
}
