//! # Entropy Budget Subsystem (MG-06)
//!
//! Tracks how much information (Shannon entropy, bits per character) each
//! field has absorbed and throttles writes that would overflow the scope's
//! budget. Usage cools linearly over time.
//!
//! ## Budgets
//!
//! | Scope | Max per fragment | Field cap | Cooling / hour |
//! |-------|------------------|-----------|----------------|
//! | conversation | 6.0 | 500 | 50 |
//! | user | 6.5 | 2 000 | 20 |
//! | organization | 7.0 | 10 000 | 10 |
//! | global | 7.5 | 50 000 | 5 |
//!
//! ## Check / Commit
//!
//! `check_budget` never mutates usage beyond applying cooling. Callers
//! `consume` only after the write has been persisted, so rejected writes
//! never count against the field.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::budget::{
    apply_cooling, entropy_budget, BudgetCheck, EntropyBudget, EntropyStatus, FieldLedger,
    WARNING_THRESHOLD,
};
pub use ports::inbound::EntropyBudgetApi;
pub use service::EntropyBudgetTracker;
