//! # Replay Records
//!
//! Nonce bookkeeping for the replay guard. Pure data structures; the guard
//! service adds persistence and locking.
//!
//! ## Security Properties
//!
//! - Nonce keys bind a nonce to one content hash: `{content_hash}:{nonce}`
//! - The cache is hard-capped; at the cap the oldest-recorded entries are
//!   evicted first, regardless of expiry
//! - Eviction never weakens replay detection on its own: consumed nonces are
//!   also written to the durable store

use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::collections::{BTreeSet, HashMap};

/// Default nonce validity window (5 minutes).
pub const DEFAULT_NONCE_TTL_MS: u64 = 5 * 60 * 1000;

/// Default in-memory nonce cap.
pub const DEFAULT_MAX_CACHED_NONCES: usize = 100_000;

/// Default interval between expired-entry sweeps (1 minute).
pub const DEFAULT_PURGE_INTERVAL_MS: u64 = 60 * 1000;

/// Replay guard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Lifetime of a replay stamp from signing.
    pub nonce_ttl_ms: u64,
    /// Hard cap on cached nonces.
    pub max_cached_nonces: usize,
    /// Minimum time between expired-entry sweeps.
    pub purge_interval_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            nonce_ttl_ms: DEFAULT_NONCE_TTL_MS,
            max_cached_nonces: DEFAULT_MAX_CACHED_NONCES,
            purge_interval_ms: DEFAULT_PURGE_INTERVAL_MS,
        }
    }
}

impl ReplayConfig {
    pub fn with_nonce_ttl_ms(mut self, ttl: u64) -> Self {
        self.nonce_ttl_ms = ttl;
        self
    }

    pub fn with_max_cached_nonces(mut self, cap: usize) -> Self {
        self.max_cached_nonces = cap.max(1);
        self
    }

    pub fn with_purge_interval_ms(mut self, interval: u64) -> Self {
        self.purge_interval_ms = interval;
        self
    }
}

/// Key under which a consumed nonce is tracked.
pub fn nonce_key(content_hash: &str, nonce: &str) -> String {
    format!("{content_hash}:{nonce}")
}

/// A consumed nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRecord {
    pub epoch: u64,
    pub recorded_at: Timestamp,
    pub expires_at: Timestamp,
}

/// Bounded map of consumed nonce keys.
#[derive(Debug)]
pub struct NonceCache {
    entries: HashMap<String, NonceRecord>,
    /// `(recorded_at, key)` for every entry, oldest first.
    order: BTreeSet<(Timestamp, String)>,
    capacity: usize,
}

impl NonceCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeSet::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a record, evicting oldest-recorded entries beyond capacity.
    /// Returns the number of evicted entries.
    pub fn insert(&mut self, key: String, record: NonceRecord) -> usize {
        if let Some(previous) = self.entries.insert(key.clone(), record) {
            self.order.remove(&(previous.recorded_at, key.clone()));
        }
        self.order.insert((record.recorded_at, key));

        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.order.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
            evicted += 1;
        }
        evicted
    }

    /// Drop entries whose stamp expired before `now`. Returns the number removed.
    pub fn purge_expired(&mut self, now: Timestamp) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, record| record.expires_at >= now);
        let entries = &self.entries;
        self.order.retain(|(_, key)| entries.contains_key(key));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
