//! # Envelope Subsystem (MG-01)
//!
//! Tamper-evident, authorship-stamped envelopes for every write, plus the
//! replay guard and provenance chains that hang off them.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Envelope shapes, hashing, chain rules. No I/O.
//! - **Ports Layer** (`ports/`): Inbound API and the outbound collaborators consumed.
//! - **Service Layer** (`service/`): Signing, replay bookkeeping, provenance storage.
//!
//! ## Security Notes
//!
//! - **Hash binding**: `content_hash` is a pure function of the payload; the
//!   signature covers the hash, never the payload bytes directly.
//! - **Author binding**: An envelope whose fingerprint does not derive from its
//!   public key fails verification even if the signature is valid.
//! - **Replay**: Nonces are bound to the exact content hash and consumed once.
//!   Epochs must strictly increase per author.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::envelope::{
    compute_content_hash, AuthorRef, EnvelopeVerification, ReplayStamp, SchemaRef, SignedEnvelope,
    VerificationChecks, FRAGMENT_SCHEMA,
};
pub use domain::provenance::{verify_chain, ProvenanceChain, ProvenanceEntry, ProvenanceOperation};
pub use domain::replay::{nonce_key, ReplayConfig};
pub use domain::share_grant::{ShareGrant, ShareGrantVerification, SHARE_GRANT_SCHEMA};
pub use ports::inbound::FragmentEnvelopeApi;
pub use service::envelope::EnvelopeService;
pub use service::provenance::{ProvenanceConfig, ProvenanceStore};
pub use service::replay::ReplayGuard;
