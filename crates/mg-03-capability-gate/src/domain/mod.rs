//! # Domain Layer

pub mod table;
