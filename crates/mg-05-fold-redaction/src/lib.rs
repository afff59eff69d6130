//! # Fold / Redaction Subsystem (MG-05)
//!
//! Strips identifying metadata from fragments before they migrate between
//! fields, and describes each migration batch as one signed
//! [`FoldOperation`].
//!
//! ## Redaction Rules
//!
//! | Metadata key | Treatment |
//! |--------------|-----------|
//! | `conversation_id` | `redacted:<16 hex>` when `redact_conversation_id` |
//! | `participants`, `author_id`, `recipient_id` | removed when `redact_participants` |
//! | `timestamp` (field) | floored to the day when `redact_timestamps` |
//! | `device_id`, `ip_address`, `user_agent` | **always** removed |
//!
//! Redaction is idempotent. A fold operation describes a batch; moving the
//! fragments is the caller's job.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::fold::{FoldOperation, FragmentMapping, FOLD_SCHEMA};
pub use domain::privacy::PrivacyPolicy;
pub use domain::redaction::{redact, ALWAYS_STRIPPED, PARTICIPANT_KEYS, REDACTED_PREFIX};
pub use ports::inbound::FoldRedactionApi;
pub use service::FoldService;
