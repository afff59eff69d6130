//! # Ports Layer
//!
//! - **Inbound (Driving)**: Fragment signing and verification API
//! - **Outbound (Driven)**: Identity, persistence, and time, defined in `shared-types`

pub mod inbound;
pub mod outbound;
