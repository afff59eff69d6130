//! # Domain Layer

pub mod degraded;
pub mod entities;
