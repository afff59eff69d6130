//! # Domain Layer
//!
//! Envelope shapes and the pure rules over them.

pub mod envelope;
pub mod provenance;
pub mod replay;
pub mod share_grant;
