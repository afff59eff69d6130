//! # BLAKE3 Hashing
//!
//! Content hashes, identity fingerprints, and key derivation.

use shared_types::{Fingerprint, Hash};

/// Length in bytes of the digest prefix used for fingerprints.
pub const FINGERPRINT_BYTES: usize = 16;

/// Hash data with BLAKE3.
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Derive a 256-bit key from a context string and input key material.
pub fn blake3_derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    blake3::derive_key(context, key_material)
}

/// Fingerprint of an Ed25519 public key: hex of the first 16 digest bytes.
pub fn derive_fingerprint(public_key: &[u8; 32]) -> Fingerprint {
    let digest = blake3_hash(public_key);
    Fingerprint::new(hex::encode(&digest[..FINGERPRINT_BYTES]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(blake3_hash(b"test"), blake3_hash(b"test"));
        assert_ne!(blake3_hash(b"input1"), blake3_hash(b"input2"));
    }

    #[test]
    fn test_derive_key_is_context_separated() {
        let a = blake3_derive_key("memory-guard key-wrap v1", b"secret");
        let b = blake3_derive_key("memory-guard other v1", b"secret");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_shape() {
        let fp = derive_fingerprint(&[9u8; 32]);
        assert_eq!(fp.as_str().len(), FINGERPRINT_BYTES * 2);
        assert_eq!(fp, derive_fingerprint(&[9u8; 32]));
        assert_ne!(fp, derive_fingerprint(&[8u8; 32]));
    }
}
