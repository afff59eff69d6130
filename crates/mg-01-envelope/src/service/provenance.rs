//! # Provenance Store
//!
//! LRU-bounded map from content hash to its provenance chain. Provenance is a
//! best-effort audit trail; the least recently touched chains are evicted
//! once capacity is reached.

use crate::domain::provenance::{
    entry_signing_bytes, ProvenanceChain, ProvenanceEntry, ProvenanceOperation,
};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::{IdentityProvider, SecurityError, TimeSource};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Default number of chains retained.
pub const DEFAULT_PROVENANCE_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    pub capacity: usize,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_PROVENANCE_CAPACITY,
        }
    }
}

impl ProvenanceConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

pub struct ProvenanceStore {
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn TimeSource>,
    chains: Mutex<LruCache<String, ProvenanceChain>>,
}

impl ProvenanceStore {
    pub fn new(
        config: ProvenanceConfig,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            identity,
            clock,
            chains: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Sign and append an entry to the chain of `content_hash`.
    pub fn append(
        &self,
        content_hash: &str,
        operation: ProvenanceOperation,
        previous_hash: Option<&str>,
    ) -> Result<ProvenanceChain, SecurityError> {
        let entry = self.signed_entry(content_hash, operation, previous_hash)?;
        let mut chains = self.chains.lock();
        let chain = chains
            .pop(content_hash)
            .unwrap_or_else(|| ProvenanceChain::new(content_hash));
        let extended = match chain.clone().append(entry) {
            Ok(extended) => extended,
            Err(e) => {
                chains.put(content_hash.to_string(), chain);
                return Err(e);
            }
        };
        chains.put(content_hash.to_string(), extended.clone());
        debug!(content_hash, operation = %operation, length = extended.len(), "Provenance appended");
        Ok(extended)
    }

    /// Start the chain of `derived_hash` from the history of `source_hash`,
    /// then append `operation` pointing back at the source.
    pub fn derive(
        &self,
        source_hash: &str,
        derived_hash: &str,
        operation: ProvenanceOperation,
    ) -> Result<ProvenanceChain, SecurityError> {
        let entry = self.signed_entry(derived_hash, operation, Some(source_hash))?;
        let mut chains = self.chains.lock();
        let history = chains
            .get(source_hash)
            .map(|c| c.entries.clone())
            .unwrap_or_default();
        let base = ProvenanceChain {
            content_hash: derived_hash.to_string(),
            entries: history,
        };
        let derived = base.append(entry)?;
        chains.put(derived_hash.to_string(), derived.clone());
        Ok(derived)
    }

    /// The chain of `content_hash`, if still retained.
    pub fn resolve(&self, content_hash: &str) -> Option<ProvenanceChain> {
        self.chains.lock().get(content_hash).cloned()
    }

    /// Whether every entry's signature verifies against its actor key.
    pub fn verify_signatures(&self, chain: &ProvenanceChain) -> bool {
        chain.entries.iter().all(|entry| {
            entry_signing_bytes(
                &entry.content_hash,
                entry.operation,
                &entry.actor,
                entry.timestamp,
                entry.previous_hash.as_deref(),
            )
            .map(|bytes| self.identity.verify(&bytes, &entry.signature, &entry.actor_key))
            .unwrap_or(false)
        })
    }

    pub fn len(&self) -> usize {
        self.chains.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn signed_entry(
        &self,
        content_hash: &str,
        operation: ProvenanceOperation,
        previous_hash: Option<&str>,
    ) -> Result<ProvenanceEntry, SecurityError> {
        let identity = self.identity.public_identity().ok_or(SecurityError::NoIdentity)?;
        let timestamp = self.clock.now();
        let bytes = entry_signing_bytes(
            content_hash,
            operation,
            &identity.fingerprint,
            timestamp,
            previous_hash,
        )?;
        Ok(ProvenanceEntry {
            content_hash: content_hash.to_string(),
            operation,
            actor: identity.fingerprint,
            actor_key: identity.public_key,
            timestamp,
            previous_hash: previous_hash.map(str::to_string),
            signature: self.identity.sign(&bytes)?,
        })
    }
}
