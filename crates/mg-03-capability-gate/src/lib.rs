//! # Capability Gate (MG-03)
//!
//! Two-stage capability check:
//!
//! 1. A static table maps each scope to the operations it allows. A capability
//!    outside that table is denied immediately and the trust evaluator is
//!    never consulted.
//! 2. Otherwise the decision is delegated to the injected `TrustEvaluator` and
//!    passed through unchanged.
//!
//! Trust can modulate a decision inside a scope's allow-list; it can never
//! grant a capability outside it.
//!
//! ## Defaults
//!
//! - No evaluator configured: listed capabilities are `ALLOW`ed.
//! - Evaluator error: `DENY`.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::table::{
    allowed_operations, capability_name, is_capability_allowed, MemoryOperation,
    CAPABILITY_PREFIX,
};
pub use ports::inbound::CapabilityGateApi;
pub use service::CapabilityGate;
