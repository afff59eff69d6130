//! # Shared Types Crate
//!
//! Domain entities, the security error taxonomy, and the outbound ports that
//! every Memory Guard subsystem consumes.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Fragments, scopes, and identities are defined here.
//! - **Ports, not singletons**: Identity, trust, persistence, and time are traits
//!   injected into each subsystem's constructor. Nothing here is process-global.
//! - **Explicit fragment contract**: The fields the security core reads
//!   (`content`, `significance`, `prime_factors`) are part of `MemoryFragment`
//!   itself, never recovered through a downcast.

pub mod entities;
pub mod errors;
pub mod ports;

pub use entities::*;
pub use errors::*;
pub use ports::*;
