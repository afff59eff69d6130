//! # Ports Layer
//!
//! - **Inbound**: `EncryptionApi`
//! - **Outbound**: `shared_types::IdentityProvider` (key agreement)

pub mod inbound;
