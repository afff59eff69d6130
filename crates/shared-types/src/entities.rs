//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `Fingerprint`, `PublicKey`, `Signature`, `PublicIdentity`
//! - **Memory**: `Scope`, `MemoryFragment`, `MemoryField`
//! - **Trust**: `TrustAssessment`, `CapabilityDecision`, `TrustDecision`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Identifier of a memory field.
pub type FieldId = String;

/// Identifier of a memory fragment.
pub type FragmentId = String;

/// One hour in milliseconds.
pub const HOUR_MS: u64 = 60 * 60 * 1000;

/// One day in milliseconds.
pub const DAY_MS: u64 = 24 * HOUR_MS;

/// Render a digest as lowercase hex.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Stable short identifier derived from an actor's public key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A 64-byte Ed25519 signature.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde_as(as = "Bytes")] pub [u8; 64]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:02x?}..)", &self.0[..4])
    }
}

/// The public half of an identity as published to other actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIdentity {
    /// Stable fingerprint of `public_key`.
    pub fingerprint: Fingerprint,
    /// Ed25519 verifying key.
    pub public_key: PublicKey,
    /// SEC1-encoded secp256k1 key-agreement key, if the actor publishes one.
    pub exchange_key: Option<Vec<u8>>,
}

// =============================================================================
// CLUSTER B: MEMORY
// =============================================================================

/// Sharing tier of a memory field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Conversation,
    User,
    Organization,
    Global,
}

impl Scope {
    pub const ALL: [Scope; 4] = [
        Scope::Conversation,
        Scope::User,
        Scope::Organization,
        Scope::Global,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Conversation => "conversation",
            Scope::User => "user",
            Scope::Organization => "organization",
            Scope::Global => "global",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conversation" => Ok(Scope::Conversation),
            "user" => Ok(Scope::User),
            "organization" => Ok(Scope::Organization),
            "global" => Ok(Scope::Global),
            other => Err(format!("unknown scope: {other}")),
        }
    }
}

/// A unit of memory written into a field.
///
/// Core content is never mutated after creation. Folds create new fragments
/// in the target field; redaction produces a modified copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFragment {
    pub id: FragmentId,
    pub field_id: FieldId,
    pub content: String,
    /// Importance in `[0, 1]`.
    pub significance: f64,
    /// Semantic coordinates compared against the field signature.
    pub prime_factors: Vec<f64>,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub timestamp: Timestamp,
}

impl MemoryFragment {
    /// Create a fragment with a fresh random id.
    pub fn new(
        field_id: impl Into<FieldId>,
        content: impl Into<String>,
        significance: f64,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            field_id: field_id.into(),
            content: content.into(),
            significance,
            prime_factors: Vec::new(),
            metadata: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn with_id(mut self, id: impl Into<FragmentId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_prime_factors(mut self, factors: Vec<f64>) -> Self {
        self.prime_factors = factors;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Approximate stored size: content plus encoded metadata.
    pub fn size_bytes(&self) -> u64 {
        let metadata_len = serde_json::to_vec(&self.metadata)
            .map(|v| v.len())
            .unwrap_or(0);
        (self.content.len() + metadata_len) as u64
    }
}

/// A scope-partitioned container of fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryField {
    pub id: FieldId,
    pub name: String,
    pub scope: Scope,
    /// Semantic signature fragments are aligned against.
    pub signature: Vec<f64>,
    pub created_at: Timestamp,
}

// =============================================================================
// CLUSTER C: TRUST
// =============================================================================

/// Opaque trust input handed to the external trust evaluator.
///
/// The security core never interprets these values; the scoring formula
/// lives with the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustAssessment {
    pub subject: Fingerprint,
    pub score: f64,
    pub social_distance: Option<u32>,
    pub stake: Option<f64>,
}

impl TrustAssessment {
    pub fn new(subject: Fingerprint, score: f64) -> Self {
        Self {
            subject,
            score,
            social_distance: None,
            stake: None,
        }
    }
}

/// Outcome of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CapabilityDecision {
    Allow,
    Confirm,
    Deny,
}

impl CapabilityDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityDecision::Allow => "ALLOW",
            CapabilityDecision::Confirm => "CONFIRM",
            CapabilityDecision::Deny => "DENY",
        }
    }
}

/// Decision plus optional human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustDecision {
    pub decision: CapabilityDecision,
    pub reason: Option<String>,
}

impl TrustDecision {
    pub fn allow() -> Self {
        Self {
            decision: CapabilityDecision::Allow,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            decision: CapabilityDecision::Deny,
            reason: Some(reason.into()),
        }
    }

    pub fn confirm(reason: impl Into<String>) -> Self {
        Self {
            decision: CapabilityDecision::Confirm,
            reason: Some(reason.into()),
        }
    }
}
