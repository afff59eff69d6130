//! # Memory Guard Test Suite
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Shared harness: in-memory store, manual clock, mock evaluators
//! ├── integration/      # Cross-subsystem scenarios through the field service
//! ├── exploits/         # Attack simulations: replay, forgery, escalation
//! └── properties.rs     # Property tests over the public surface
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mg-tests
//! cargo test -p mg-tests integration::
//! cargo test -p mg-tests exploits::
//! ```

#![allow(dead_code)]

pub mod exploits;
pub mod fixtures;
pub mod integration;
pub mod properties;
