//! # Domain Layer
//!
//! Pure scoring functions and the static per-scope thresholds.

pub mod policy;
pub mod scoring;
