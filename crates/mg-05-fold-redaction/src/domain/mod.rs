pub mod fold;
pub mod privacy;
pub mod redaction;
