//! # Outbound Ports
//!
//! The envelope subsystem consumes the shared identity, store, and clock ports.

pub use shared_types::{IdentityProvider, PersistentStore, TimeSource};
