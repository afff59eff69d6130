//! # Outbound Ports
//!
//! Collaborators the security core consumes but does not own. Each is injected
//! into a subsystem's constructor; test and local adapters live at the bottom
//! of this file.
//!
//! | Port | Production | Testing |
//! |------|------------|---------|
//! | `IdentityProvider` | `shared_crypto::LocalIdentity` | same, with generated keys |
//! | `TrustEvaluator` | external trust gate | inline mocks |
//! | `PersistentStore` | external graph store | `InMemoryStore` |
//! | `TimeSource` | `SystemTimeSource` | `ManualClock` |

use crate::entities::{PublicIdentity, PublicKey, Signature, Timestamp, TrustAssessment, TrustDecision};
use crate::errors::{SecurityError, StoreError};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// IDENTITY
// =============================================================================

/// Identity capability: signing, verification, and key agreement.
///
/// Key custody stays with the provider; the core never sees secret material.
pub trait IdentityProvider: Send + Sync {
    /// The active identity, or `None` if none is configured.
    fn public_identity(&self) -> Option<PublicIdentity>;

    /// Sign `data` with the active identity.
    fn sign(&self, data: &[u8]) -> Result<Signature, SecurityError>;

    /// Verify `signature` over `data` against an arbitrary public key.
    fn verify(&self, data: &[u8], signature: &Signature, public_key: &PublicKey) -> bool;

    /// Encrypt `plaintext` under the key agreed with `peer_exchange_key`.
    fn ecdh_encrypt(&self, plaintext: &[u8], peer_exchange_key: &[u8]) -> Result<Vec<u8>, SecurityError>;

    /// Decrypt output of `ecdh_encrypt` produced by (or for) `peer_exchange_key`.
    fn ecdh_decrypt(&self, ciphertext: &[u8], peer_exchange_key: &[u8]) -> Result<Vec<u8>, SecurityError>;
}

// =============================================================================
// TRUST
// =============================================================================

/// External trust gate.
///
/// Only consulted for capabilities the scope's static table already lists.
#[async_trait]
pub trait TrustEvaluator: Send + Sync {
    async fn check_capability(
        &self,
        capability: &str,
        assessment: &TrustAssessment,
    ) -> Result<TrustDecision, SecurityError>;
}

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Opaque path-addressed store for durable records.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn put(&self, path: &str, value: Vec<u8>) -> Result<(), StoreError>;

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}

/// Serialize `value` as JSON and store it at `path`.
pub async fn put_json<T: Serialize + Sync>(
    store: &dyn PersistentStore,
    path: &str,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Corrupt {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    store.put(path, bytes).await
}

/// Load and decode the JSON record at `path`.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn PersistentStore,
    path: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(path).await? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

// =============================================================================
// TIME
// =============================================================================

/// Source of wall-clock milliseconds.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Settable clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Process-local `PersistentStore`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.data.read().contains_key(path)
    }
}

#[async_trait]
impl PersistentStore for InMemoryStore {
    async fn put(&self, path: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.data.write().insert(path.to_string(), value);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.read().get(path).cloned())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.data.write().remove(path);
        Ok(())
    }
}
