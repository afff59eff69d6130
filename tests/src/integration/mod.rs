//! # Integration Scenarios
//!
//! End-to-end flows through `MemoryFieldService`.

pub mod encryption;
pub mod fold;
pub mod gc;
pub mod write_path;
