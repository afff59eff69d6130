//! # Subsystem Container
//!
//! Configuration and construction of every security subsystem.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, MemoryGuardConfig};
pub use subsystems::SubsystemContainer;
