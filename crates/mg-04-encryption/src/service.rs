//! # Encryption Service
//!
//! Encrypts a fragment once under a fresh content key and wraps that key per
//! reader. ECDH wrapping is used whenever both the local identity and the
//! reader publish an exchange key; otherwise the degraded wrap applies,
//! subject to [`KeyWrapPolicy`].

use crate::domain::degraded;
use crate::domain::entities::{
    EncryptedFragment, EncryptionConfig, KeyWrap, KeyWrapMethod, KeyWrapPolicy, ReaderKey,
};
use crate::ports::inbound::EncryptionApi;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use mg_telemetry::metrics::KEY_WRAPS;
use shared_crypto::{decrypt, encrypt, Nonce, SecretKey};
use shared_types::{
    EncryptionFailure, Fingerprint, IdentityProvider, MemoryFragment, SecurityError,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct EncryptionService {
    identity: Arc<dyn IdentityProvider>,
    config: EncryptionConfig,
}

impl EncryptionService {
    pub fn new(identity: Arc<dyn IdentityProvider>, config: EncryptionConfig) -> Self {
        Self { identity, config }
    }

    pub fn config(&self) -> &EncryptionConfig {
        &self.config
    }

    pub fn encrypt(
        &self,
        fragment: &MemoryFragment,
        readers: &[ReaderKey],
    ) -> Result<EncryptedFragment, SecurityError> {
        if readers.is_empty() {
            return Err(SecurityError::Validation(
                "encryption requires at least one reader".into(),
            ));
        }
        let local = self
            .identity
            .public_identity()
            .ok_or(SecurityError::NoIdentity)?;

        let plaintext = serde_json::to_vec(fragment)?;
        let key = SecretKey::generate();
        let (ciphertext, nonce) = encrypt(&key, &plaintext)?;

        let key_wraps = readers
            .iter()
            .map(|reader| self.wrap_for_reader(&key, reader, local.exchange_key.is_some()))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            fragment_id = %fragment.id,
            readers = key_wraps.len(),
            "Fragment encrypted"
        );

        Ok(EncryptedFragment {
            fragment_id: fragment.id.clone(),
            ciphertext,
            nonce: nonce.as_bytes().to_vec(),
            key_wraps,
            sender: local.fingerprint,
            sender_exchange_key: local.exchange_key,
        })
    }

    pub fn decrypt(
        &self,
        encrypted: &EncryptedFragment,
        reader: &Fingerprint,
        sender_exchange_key: Option<&[u8]>,
    ) -> Result<MemoryFragment, SecurityError> {
        let Some(wrap) = encrypted.wrap_for(reader) else {
            warn!(
                security_event = "decrypt_not_authorized",
                fragment_id = %encrypted.fragment_id,
                reader = %reader,
                "No key wrap for reader"
            );
            return Err(EncryptionFailure::NotAuthorized {
                fingerprint: reader.clone(),
            }
            .into());
        };

        let wrapped = STANDARD
            .decode(&wrap.wrapped_key)
            .map_err(|e| EncryptionFailure::KeyWrapFailed(format!("invalid base64: {e}")))?;

        let key = match wrap.method {
            KeyWrapMethod::Ecdh => self.ecdh_unwrap(&wrapped, encrypted, sender_exchange_key)?,
            KeyWrapMethod::Degraded => {
                if !self.config.allows_degraded() {
                    return Err(EncryptionFailure::DegradedWrapRefused {
                        fingerprint: reader.clone(),
                    }
                    .into());
                }
                degraded::unwrap(&wrapped, reader)?
            }
        };

        let nonce = Nonce::from_slice(&encrypted.nonce)
            .map_err(|_| EncryptionFailure::DecryptionFailed)?;
        let plaintext = decrypt(&key, &encrypted.ciphertext, &nonce)
            .map_err(|_| EncryptionFailure::DecryptionFailed)?;
        let fragment: MemoryFragment =
            serde_json::from_slice(&plaintext).map_err(|_| EncryptionFailure::DecryptionFailed)?;
        Ok(fragment)
    }

    fn wrap_for_reader(
        &self,
        key: &SecretKey,
        reader: &ReaderKey,
        local_can_exchange: bool,
    ) -> Result<KeyWrap, SecurityError> {
        if let (true, Some(peer)) = (local_can_exchange, reader.exchange_key.as_deref()) {
            let wrapped = self.identity.ecdh_encrypt(key.as_bytes(), peer)?;
            KEY_WRAPS.with_label_values(&["ecdh"]).inc();
            return Ok(KeyWrap {
                reader_fingerprint: reader.fingerprint.clone(),
                wrapped_key: STANDARD.encode(wrapped),
                method: KeyWrapMethod::Ecdh,
            });
        }

        if self.config.key_wrap_policy == KeyWrapPolicy::RequireEcdh {
            warn!(
                security_event = "degraded_key_wrap_refused",
                reader = %reader.fingerprint,
                "Reader has no usable exchange key"
            );
            return Err(EncryptionFailure::DegradedWrapRefused {
                fingerprint: reader.fingerprint.clone(),
            }
            .into());
        }

        warn!(
            security_event = "degraded_key_wrap",
            reader = %reader.fingerprint,
            "Content key wrapped without ECDH; readable by any holder"
        );
        KEY_WRAPS.with_label_values(&["degraded"]).inc();
        Ok(KeyWrap {
            reader_fingerprint: reader.fingerprint.clone(),
            wrapped_key: STANDARD.encode(degraded::wrap(key, &reader.fingerprint)),
            method: KeyWrapMethod::Degraded,
        })
    }

    /// Unwrap with the supplied sender key, or else try the local exchange
    /// key (self-addressed wraps) and then the key the sender embedded.
    fn ecdh_unwrap(
        &self,
        wrapped: &[u8],
        encrypted: &EncryptedFragment,
        sender_exchange_key: Option<&[u8]>,
    ) -> Result<SecretKey, SecurityError> {
        let candidates: Vec<Vec<u8>> = match sender_exchange_key {
            Some(peer) => vec![peer.to_vec()],
            None => {
                let own = self
                    .identity
                    .public_identity()
                    .and_then(|identity| identity.exchange_key);
                own.into_iter()
                    .chain(encrypted.sender_exchange_key.clone())
                    .collect()
            }
        };

        for peer in &candidates {
            if let Ok(bytes) = self.identity.ecdh_decrypt(wrapped, peer) {
                return to_secret_key(&bytes);
            }
        }
        Err(EncryptionFailure::KeyWrapFailed("no exchange key unwraps the content key".into()).into())
    }
}

fn to_secret_key(bytes: &[u8]) -> Result<SecretKey, SecurityError> {
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| EncryptionFailure::KeyWrapFailed(format!("unwrapped key is {} bytes", bytes.len())))?;
    Ok(SecretKey::from_bytes(array))
}

impl EncryptionApi for EncryptionService {
    fn encrypt_fragment(
        &self,
        fragment: &MemoryFragment,
        readers: &[ReaderKey],
    ) -> Result<EncryptedFragment, SecurityError> {
        self.encrypt(fragment, readers)
    }

    fn decrypt_fragment(
        &self,
        encrypted: &EncryptedFragment,
        reader: &Fingerprint,
        sender_exchange_key: Option<&[u8]>,
    ) -> Result<MemoryFragment, SecurityError> {
        self.decrypt(encrypted, reader, sender_exchange_key)
    }
}
