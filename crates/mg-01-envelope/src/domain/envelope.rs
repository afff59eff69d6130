//! # Signed Envelope
//!
//! A hash-addressed wrapper carrying authorship and schema metadata around a
//! payload. Envelopes are immutable; a modification is a new envelope whose
//! `parent_hash` names its predecessor.
//!
//! ## Signed Header
//!
//! The signature covers the canonical JSON encoding of:
//!
//! | Field | Notes |
//! |-------|-------|
//! | `content_hash` | BLAKE3 of the payload's canonical JSON, hex |
//! | `schema` | name + version |
//! | `capabilities` | declared capabilities, in order |
//! | `parent_hash` | optional predecessor envelope hash |
//! | `author` | fingerprint + Ed25519 public key |
//! | `created_at` | milliseconds |
//! | `replay` | optional `{epoch, nonce, expires_at}` stamp |

use serde::{Deserialize, Serialize};
use shared_crypto::blake3_hash;
use shared_types::{hash_hex, Fingerprint, PublicKey, SecurityError, Signature, Timestamp};

/// Schema name for memory fragments.
pub const FRAGMENT_SCHEMA: &str = "memory.fragment";

/// Payload schema identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
    pub name: String,
    pub version: u32,
}

impl SchemaRef {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Non-empty name and version of at least 1.
    pub fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty() && self.version >= 1
    }
}

/// Author identity embedded in the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub fingerprint: Fingerprint,
    pub public_key: PublicKey,
}

/// Replay protection carried inside the signed header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStamp {
    pub epoch: u64,
    pub nonce: String,
    pub expires_at: Timestamp,
}

/// Signed envelope around a payload `T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEnvelope<T> {
    pub payload: T,
    pub content_hash: String,
    pub signature: Signature,
    pub author: AuthorRef,
    pub schema: SchemaRef,
    pub capabilities: Vec<String>,
    pub parent_hash: Option<String>,
    pub created_at: Timestamp,
    pub replay: Option<ReplayStamp>,
}

#[derive(Serialize)]
struct HeaderRef<'a> {
    content_hash: &'a str,
    schema: &'a SchemaRef,
    capabilities: &'a [String],
    parent_hash: Option<&'a str>,
    author: &'a AuthorRef,
    created_at: Timestamp,
    replay: Option<&'a ReplayStamp>,
}

/// Unsigned envelope fields, as assembled before signing.
pub(crate) struct UnsignedHeader {
    pub content_hash: String,
    pub schema: SchemaRef,
    pub capabilities: Vec<String>,
    pub parent_hash: Option<String>,
    pub author: AuthorRef,
    pub created_at: Timestamp,
    pub replay: Option<ReplayStamp>,
}

impl UnsignedHeader {
    pub(crate) fn signing_bytes(&self) -> Result<Vec<u8>, SecurityError> {
        header_bytes(
            &self.content_hash,
            &self.schema,
            &self.capabilities,
            self.parent_hash.as_deref(),
            &self.author,
            self.created_at,
            self.replay.as_ref(),
        )
    }

    pub(crate) fn seal<T>(self, payload: T, signature: Signature) -> SignedEnvelope<T> {
        SignedEnvelope {
            payload,
            content_hash: self.content_hash,
            signature,
            author: self.author,
            schema: self.schema,
            capabilities: self.capabilities,
            parent_hash: self.parent_hash,
            created_at: self.created_at,
            replay: self.replay,
        }
    }
}

fn header_bytes(
    content_hash: &str,
    schema: &SchemaRef,
    capabilities: &[String],
    parent_hash: Option<&str>,
    author: &AuthorRef,
    created_at: Timestamp,
    replay: Option<&ReplayStamp>,
) -> Result<Vec<u8>, SecurityError> {
    let header = HeaderRef {
        content_hash,
        schema,
        capabilities,
        parent_hash,
        author,
        created_at,
        replay,
    };
    Ok(serde_json::to_vec(&header)?)
}

impl<T> SignedEnvelope<T> {
    /// Bytes covered by the signature.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, SecurityError> {
        header_bytes(
            &self.content_hash,
            &self.schema,
            &self.capabilities,
            self.parent_hash.as_deref(),
            &self.author,
            self.created_at,
            self.replay.as_ref(),
        )
    }

    /// Hash identifying this envelope, used as a child's `parent_hash`.
    pub fn envelope_hash(&self) -> Result<String, SecurityError> {
        let mut bytes = self.signing_bytes()?;
        bytes.extend_from_slice(self.signature.as_bytes());
        Ok(hash_hex(&blake3_hash(&bytes)))
    }
}

/// BLAKE3 of the payload's canonical JSON encoding, hex.
pub fn compute_content_hash<T: Serialize>(payload: &T) -> Result<String, SecurityError> {
    let bytes = serde_json::to_vec(payload)?;
    Ok(hash_hex(&blake3_hash(&bytes)))
}

/// Individually reported verification sub-checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationChecks {
    pub content_hash: bool,
    pub author_binding: bool,
    pub signature: bool,
    pub schema: bool,
}

impl VerificationChecks {
    pub fn all_passed(&self) -> bool {
        self.content_hash && self.author_binding && self.signature && self.schema
    }

    /// Name of the first failing check, in evaluation order.
    pub fn first_failure(&self) -> Option<&'static str> {
        [
            ("content_hash", self.content_hash),
            ("author_binding", self.author_binding),
            ("signature", self.signature),
            ("schema", self.schema),
        ]
        .into_iter()
        .find(|(_, passed)| !passed)
        .map(|(name, _)| name)
    }
}

/// Outcome of envelope verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeVerification {
    pub valid: bool,
    pub checks: VerificationChecks,
    pub error: Option<String>,
}

impl EnvelopeVerification {
    pub fn from_checks(checks: VerificationChecks) -> Self {
        let error = checks.first_failure().map(|name| format!("{name} check failed"));
        Self {
            valid: error.is_none(),
            checks,
            error,
        }
    }
}
