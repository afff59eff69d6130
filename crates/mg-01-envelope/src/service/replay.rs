//! # Replay Guard
//!
//! Per-author monotonic epochs and single-use nonces bound to content hashes.
//!
//! ## Verification Order
//!
//! 1. Reject if the stamp has expired
//! 2. Reject if the nonce key was already consumed
//! 3. Reject if the epoch is not greater than the last observed for the author
//! 4. Record the nonce and advance the observed epoch
//!
//! Checks 2-4 run under one lock, so two concurrent admissions of the same
//! nonce cannot both succeed.
//!
//! ## Persistence
//!
//! | Record | Path |
//! |--------|------|
//! | issued epoch | `replay/epoch/issued/{fingerprint}` |
//! | observed epoch | `replay/epoch/observed/{fingerprint}` |
//! | consumed nonce | `replay/nonce/{content_hash}:{nonce}` |
//!
//! Store writes are best effort: failures are logged and the in-memory state
//! is kept. Reads that fail are treated as "no record".

use crate::domain::replay::{nonce_key, NonceCache, NonceRecord, ReplayConfig};
use crate::domain::envelope::ReplayStamp;
use mg_telemetry::metrics::REPLAY_REJECTIONS;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::{
    get_json, put_json, Fingerprint, PersistentStore, ReplayReason, SecurityError, TimeSource,
    Timestamp,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct EpochRecord {
    epoch: u64,
}

struct GuardState {
    nonces: NonceCache,
    issued: HashMap<Fingerprint, u64>,
    observed: HashMap<Fingerprint, u64>,
    last_purge: Timestamp,
}

/// Replay guard owned by one security service instance.
pub struct ReplayGuard {
    config: ReplayConfig,
    store: Arc<dyn PersistentStore>,
    clock: Arc<dyn TimeSource>,
    state: Mutex<GuardState>,
}

impl ReplayGuard {
    pub fn new(
        config: ReplayConfig,
        store: Arc<dyn PersistentStore>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let last_purge = clock.now();
        Self {
            state: Mutex::new(GuardState {
                nonces: NonceCache::new(config.max_cached_nonces),
                issued: HashMap::new(),
                observed: HashMap::new(),
                last_purge,
            }),
            config,
            store,
            clock,
        }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Fresh replay stamp for content about to be signed by `author`.
    pub async fn issue_stamp(&self, author: &Fingerprint) -> ReplayStamp {
        let epoch = self.next_epoch(author).await;
        ReplayStamp {
            epoch,
            nonce: uuid::Uuid::new_v4().to_string(),
            expires_at: self.clock.now().saturating_add(self.config.nonce_ttl_ms),
        }
    }

    /// Next signing epoch for `author`, strictly greater than any previously
    /// issued or observed epoch. Persisted before it is returned.
    pub async fn next_epoch(&self, author: &Fingerprint) -> u64 {
        let cached = self.state.lock().issued.contains_key(author);
        let stored = if cached {
            0
        } else {
            let issued = self.load_epoch(&issued_path(author)).await;
            let observed = self.load_epoch(&observed_path(author)).await;
            issued.max(observed)
        };

        let epoch = {
            let mut state = self.state.lock();
            let observed = state.observed.get(author).copied().unwrap_or(0);
            let issued = state.issued.entry(author.clone()).or_insert(stored);
            *issued = (*issued).max(observed) + 1;
            *issued
        };

        self.persist_epoch(&issued_path(author), epoch).await;
        debug!(fingerprint = %author, epoch, "Issued epoch");
        epoch
    }

    /// Whether the nonce key has been consumed (cache or durable store).
    pub async fn is_nonce_used(&self, content_hash: &str, nonce: &str) -> bool {
        let key = nonce_key(content_hash, nonce);
        if self.state.lock().nonces.contains(&key) {
            return true;
        }
        self.load_nonce(&key).await
    }

    /// Mark a nonce key consumed without epoch checks.
    pub async fn record_nonce(&self, content_hash: &str, stamp: &ReplayStamp) {
        let key = nonce_key(content_hash, &stamp.nonce);
        let record = NonceRecord {
            epoch: stamp.epoch,
            recorded_at: self.clock.now(),
            expires_at: stamp.expires_at,
        };
        self.state.lock().nonces.insert(key.clone(), record);
        self.persist_nonce(&key, &record).await;
    }

    /// Admit an incoming fragment, consuming its nonce.
    pub async fn verify(
        &self,
        author: &Fingerprint,
        content_hash: &str,
        stamp: &ReplayStamp,
    ) -> Result<(), SecurityError> {
        let now = self.clock.now();
        if now > stamp.expires_at {
            return Err(self.reject(
                ReplayReason::Expired,
                author,
                format!("stamp expired at {} (now {now})", stamp.expires_at),
            ));
        }

        let key = nonce_key(content_hash, &stamp.nonce);
        let (cached_nonce, cached_epoch) = {
            let state = self.state.lock();
            (state.nonces.contains(&key), state.observed.contains_key(author))
        };
        let durable_nonce = !cached_nonce && self.load_nonce(&key).await;
        let stored_epoch = if cached_epoch {
            0
        } else {
            self.load_epoch(&observed_path(author)).await
        };

        let record = NonceRecord {
            epoch: stamp.epoch,
            recorded_at: now,
            expires_at: stamp.expires_at,
        };
        {
            let mut state = self.state.lock();
            self.maybe_purge(&mut state, now);

            if durable_nonce || state.nonces.contains(&key) {
                drop(state);
                return Err(self.reject(
                    ReplayReason::NonceReused,
                    author,
                    format!("nonce {key} already consumed"),
                ));
            }

            let last = *state.observed.entry(author.clone()).or_insert(stored_epoch);
            if stamp.epoch <= last {
                drop(state);
                return Err(self.reject(
                    ReplayReason::StaleEpoch,
                    author,
                    format!("epoch {} <= last observed {last}", stamp.epoch),
                ));
            }

            state.observed.insert(author.clone(), stamp.epoch);
            let evicted = state.nonces.insert(key.clone(), record);
            if evicted > 0 {
                debug!(evicted, "Nonce cache at capacity, evicted oldest entries");
            }
        }

        self.persist_nonce(&key, &record).await;
        self.persist_epoch(&observed_path(author), stamp.epoch).await;
        Ok(())
    }

    /// Read path: confirm the nonce was admitted through `verify` at some point.
    pub async fn confirm_admitted(
        &self,
        author: &Fingerprint,
        content_hash: &str,
        stamp: &ReplayStamp,
    ) -> Result<(), SecurityError> {
        if self.is_nonce_used(content_hash, &stamp.nonce).await {
            Ok(())
        } else {
            Err(self.reject(
                ReplayReason::NotAdmitted,
                author,
                format!("nonce {} was never admitted", nonce_key(content_hash, &stamp.nonce)),
            ))
        }
    }

    /// Drop expired cache entries now. Returns the number removed.
    pub fn purge(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.last_purge = now;
        state.nonces.purge_expired(now)
    }

    pub fn cached_nonces(&self) -> usize {
        self.state.lock().nonces.len()
    }

    fn maybe_purge(&self, state: &mut GuardState, now: Timestamp) {
        if now.saturating_sub(state.last_purge) >= self.config.purge_interval_ms {
            let removed = state.nonces.purge_expired(now);
            state.last_purge = now;
            if removed > 0 {
                debug!(removed, "Purged expired nonces");
            }
        }
    }

    fn reject(&self, reason: ReplayReason, author: &Fingerprint, detail: String) -> SecurityError {
        REPLAY_REJECTIONS.with_label_values(&[reason.as_str()]).inc();
        warn!(
            security_event = "replay_rejected",
            reason = %reason,
            fingerprint = %author,
            detail = %detail,
            "Replay guard rejected fragment"
        );
        SecurityError::replay(reason, detail)
    }

    async fn load_epoch(&self, path: &str) -> u64 {
        match get_json::<EpochRecord>(self.store.as_ref(), path).await {
            Ok(record) => record.map(|r| r.epoch).unwrap_or(0),
            Err(e) => {
                warn!(path, error = %e, "Failed to load epoch; assuming none");
                0
            }
        }
    }

    async fn persist_epoch(&self, path: &str, epoch: u64) {
        if let Err(e) = put_json(self.store.as_ref(), path, &EpochRecord { epoch }).await {
            warn!(path, epoch, error = %e, "Failed to persist epoch; keeping in-memory value");
        }
    }

    async fn load_nonce(&self, key: &str) -> bool {
        let path = nonce_path(key);
        match self.store.get(&path).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to load nonce record");
                false
            }
        }
    }

    async fn persist_nonce(&self, key: &str, record: &NonceRecord) {
        let path = nonce_path(key);
        if let Err(e) = put_json(self.store.as_ref(), &path, record).await {
            warn!(path = %path, error = %e, "Failed to persist nonce; keeping in-memory record");
        }
    }
}

fn issued_path(author: &Fingerprint) -> String {
    format!("replay/epoch/issued/{author}")
}

fn observed_path(author: &Fingerprint) -> String {
    format!("replay/epoch/observed/{author}")
}

fn nonce_path(key: &str) -> String {
    format!("replay/nonce/{key}")
}
