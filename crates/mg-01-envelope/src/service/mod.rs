//! # Service Layer
//!
//! - `envelope`: signing, verification, fragment admission, share grants
//! - `replay`: epochs and nonce consumption with best-effort persistence
//! - `provenance`: LRU-bounded chain store

pub mod envelope;
pub mod provenance;
pub mod replay;
