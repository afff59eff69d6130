//! Static scope to operation table.

use serde::{Deserialize, Serialize};
use shared_types::Scope;
use std::fmt;
use std::str::FromStr;

/// Prefix of every memory capability name.
pub const CAPABILITY_PREFIX: &str = "memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryOperation {
    Read,
    Write,
    Fold,
    Share,
    Admin,
}

impl MemoryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryOperation::Read => "read",
            MemoryOperation::Write => "write",
            MemoryOperation::Fold => "fold",
            MemoryOperation::Share => "share",
            MemoryOperation::Admin => "admin",
        }
    }

    /// `memory:<operation>`
    pub fn capability(&self) -> String {
        capability_name(*self)
    }
}

impl fmt::Display for MemoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(MemoryOperation::Read),
            "write" => Ok(MemoryOperation::Write),
            "fold" => Ok(MemoryOperation::Fold),
            "share" => Ok(MemoryOperation::Share),
            "admin" => Ok(MemoryOperation::Admin),
            other => Err(format!("unknown memory operation: {other}")),
        }
    }
}

pub fn capability_name(operation: MemoryOperation) -> String {
    format!("{CAPABILITY_PREFIX}{}", operation.as_str())
}

pub fn allowed_operations(scope: Scope) -> &'static [MemoryOperation] {
    use MemoryOperation::*;
    match scope {
        Scope::Conversation => &[Read, Write],
        Scope::User => &[Read, Write, Fold, Share],
        Scope::Organization => &[Read, Write, Fold, Share, Admin],
        Scope::Global => &[Read, Write, Fold, Admin],
    }
}

/// Whether `capability` is listed for `scope`. Unknown names are never listed.
pub fn is_capability_allowed(capability: &str, scope: Scope) -> bool {
    capability
        .strip_prefix(CAPABILITY_PREFIX)
        .and_then(|op| op.parse::<MemoryOperation>().ok())
        .map(|op| allowed_operations(scope).contains(&op))
        .unwrap_or(false)
}
