//! Encryption entities.

use serde::{Deserialize, Serialize};
use shared_types::{Fingerprint, FragmentId, PublicIdentity};
use std::fmt;

/// How a reader's copy of the content key was wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyWrapMethod {
    Ecdh,
    Degraded,
}

impl KeyWrapMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyWrapMethod::Ecdh => "ecdh",
            KeyWrapMethod::Degraded => "degraded",
        }
    }
}

impl fmt::Display for KeyWrapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reader's wrapped content key. `wrapped_key` is base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWrap {
    pub reader_fingerprint: Fingerprint,
    pub wrapped_key: String,
    pub method: KeyWrapMethod,
}

/// An encrypted fragment and its per-reader key wraps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedFragment {
    pub fragment_id: FragmentId,
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub key_wraps: Vec<KeyWrap>,
    pub sender: Fingerprint,
    /// SEC1 exchange key of the sender, when it has one.
    pub sender_exchange_key: Option<Vec<u8>>,
}

impl EncryptedFragment {
    pub fn wrap_for(&self, reader: &Fingerprint) -> Option<&KeyWrap> {
        self.key_wraps
            .iter()
            .find(|wrap| &wrap.reader_fingerprint == reader)
    }

    pub fn readers(&self) -> impl Iterator<Item = &Fingerprint> {
        self.key_wraps.iter().map(|wrap| &wrap.reader_fingerprint)
    }
}

/// A reader the content key is wrapped for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderKey {
    pub fingerprint: Fingerprint,
    pub exchange_key: Option<Vec<u8>>,
}

impl ReaderKey {
    pub fn new(fingerprint: Fingerprint, exchange_key: Option<Vec<u8>>) -> Self {
        Self {
            fingerprint,
            exchange_key,
        }
    }
}

impl From<&PublicIdentity> for ReaderKey {
    fn from(identity: &PublicIdentity) -> Self {
        Self {
            fingerprint: identity.fingerprint.clone(),
            exchange_key: identity.exchange_key.clone(),
        }
    }
}

/// Whether readers without an exchange key may receive a degraded wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyWrapPolicy {
    #[default]
    AllowDegraded,
    RequireEcdh,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    pub key_wrap_policy: KeyWrapPolicy,
}

impl EncryptionConfig {
    pub fn with_key_wrap_policy(mut self, policy: KeyWrapPolicy) -> Self {
        self.key_wrap_policy = policy;
        self
    }

    pub fn allows_degraded(&self) -> bool {
        self.key_wrap_policy == KeyWrapPolicy::AllowDegraded
    }
}
