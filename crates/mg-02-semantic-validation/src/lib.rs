//! # Semantic Validation Subsystem (MG-02)
//!
//! Scores a fragment's alignment with its field's semantic signature and the
//! Shannon entropy of its content, then applies the scope's significance floor.
//!
//! ## Scope Enforcement
//!
//! | Scope | Min entropy | On failure |
//! |-------|-------------|------------|
//! | conversation | 0.0 | warn, proceed |
//! | user | 1.0 | warn, proceed |
//! | organization | 2.0 | warn, proceed |
//! | global | 3.0 | reject |

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::policy::{validation_policy, ValidationPolicy};
pub use domain::scoring::{coherence, prime_alignment, shannon_entropy, SemanticValidation};
pub use ports::inbound::SemanticValidationApi;
pub use service::SemanticValidator;
