//! Inbound port for fragment encryption.

use crate::domain::entities::{EncryptedFragment, ReaderKey};
use shared_types::{Fingerprint, MemoryFragment, SecurityError};

pub trait EncryptionApi: Send + Sync {
    /// Encrypt `fragment` under a fresh key wrapped for each reader.
    fn encrypt_fragment(
        &self,
        fragment: &MemoryFragment,
        readers: &[ReaderKey],
    ) -> Result<EncryptedFragment, SecurityError>;

    /// Decrypt as `reader`. `sender_exchange_key` overrides self-unwrap.
    fn decrypt_fragment(
        &self,
        encrypted: &EncryptedFragment,
        reader: &Fingerprint,
        sender_exchange_key: Option<&[u8]>,
    ) -> Result<MemoryFragment, SecurityError>;
}
