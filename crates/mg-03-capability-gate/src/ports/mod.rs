//! # Ports Layer
//!
//! - **Inbound**: `CapabilityGateApi`
//! - **Outbound**: `shared_types::TrustEvaluator`

pub mod inbound;
