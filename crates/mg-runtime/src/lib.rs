//! # Memory Guard Runtime
//!
//! Wires the security subsystems together and exposes them as one service.
//!
//! - `container/` - configuration and subsystem construction
//! - `security` - [`MemorySecurityService`], the produced surface
//! - `fields` - [`MemoryFieldService`], a store-backed memory-field service
//!   that routes every operation through the security checks
//!
//! ## Write Flow
//!
//! ```text
//! draft -> Capability Gate -> Semantic Validator -> Entropy Budget (check)
//!       -> Envelope Signer + Replay Guard (admit) -> store -> Entropy Budget (consume)
//! ```

pub mod container;
pub mod fields;
pub mod security;

pub use container::{ConfigError, MemoryGuardConfig, SubsystemContainer};
pub use fields::{
    FieldQuery, FoldOptions, FoldResult, FragmentDraft, MemoryFieldService, RejectedFragment,
    VALIDATION_KEY,
};
pub use security::MemorySecurityService;
