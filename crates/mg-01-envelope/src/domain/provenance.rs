//! # Provenance Chains
//!
//! Ordered operation history for a piece of content, keyed by its current
//! content hash. The only continuity rule is that timestamps never decrease.

use serde::{Deserialize, Serialize};
use shared_types::{Fingerprint, PublicKey, SecurityError, Signature, Timestamp};
use std::fmt;

/// What happened to the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvenanceOperation {
    Created,
    Modified,
    Folded,
}

impl ProvenanceOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvenanceOperation::Created => "created",
            ProvenanceOperation::Modified => "modified",
            ProvenanceOperation::Folded => "folded",
        }
    }
}

impl fmt::Display for ProvenanceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One signed step in a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    /// Hash the entry was signed over. Differs from the chain's hash for
    /// entries inherited through a derivation.
    pub content_hash: String,
    pub operation: ProvenanceOperation,
    pub actor: Fingerprint,
    pub actor_key: PublicKey,
    pub timestamp: Timestamp,
    pub previous_hash: Option<String>,
    pub signature: Signature,
}

#[derive(Serialize)]
struct EntryHeader<'a> {
    content_hash: &'a str,
    operation: ProvenanceOperation,
    actor: &'a Fingerprint,
    timestamp: Timestamp,
    previous_hash: Option<&'a str>,
}

/// Bytes an actor signs for an entry on `content_hash`.
pub fn entry_signing_bytes(
    content_hash: &str,
    operation: ProvenanceOperation,
    actor: &Fingerprint,
    timestamp: Timestamp,
    previous_hash: Option<&str>,
) -> Result<Vec<u8>, SecurityError> {
    Ok(serde_json::to_vec(&EntryHeader {
        content_hash,
        operation,
        actor,
        timestamp,
        previous_hash,
    })?)
}

/// History of one content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceChain {
    pub content_hash: String,
    pub entries: Vec<ProvenanceEntry>,
}

impl ProvenanceChain {
    pub fn new(content_hash: impl Into<String>) -> Self {
        Self {
            content_hash: content_hash.into(),
            entries: Vec::new(),
        }
    }

    /// Append `entry`, returning the extended chain.
    ///
    /// Fails with `Provenance` if the entry predates the current head.
    pub fn append(mut self, entry: ProvenanceEntry) -> Result<Self, SecurityError> {
        if let Some(last) = self.entries.last() {
            if entry.timestamp < last.timestamp {
                return Err(SecurityError::Provenance(format!(
                    "entry at {} precedes chain head at {} for {}",
                    entry.timestamp, last.timestamp, self.content_hash
                )));
            }
        }
        self.entries.push(entry);
        Ok(self)
    }

    pub fn head(&self) -> Option<&ProvenanceEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Valid iff timestamps are non-decreasing. Empty and single-entry chains
/// are trivially valid.
pub fn verify_chain(entries: &[ProvenanceEntry]) -> bool {
    entries
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp)
}
