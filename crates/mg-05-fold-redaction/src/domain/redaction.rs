//! Metadata redaction for folds.

use crate::domain::privacy::PrivacyPolicy;
use serde_json::Value;
use shared_crypto::blake3_hash;
use shared_types::{MemoryFragment, DAY_MS};

pub const REDACTED_PREFIX: &str = "redacted:";

pub const CONVERSATION_KEY: &str = "conversation_id";

pub const PARTICIPANT_KEYS: [&str; 3] = ["participants", "author_id", "recipient_id"];

/// Stripped whatever the policy says.
pub const ALWAYS_STRIPPED: [&str; 3] = ["device_id", "ip_address", "user_agent"];

const REDACTED_HEX_LEN: usize = 16;

/// Return a redacted copy of `fragment`. Content, id and significance are
/// untouched.
pub fn redact(fragment: &MemoryFragment, policy: &PrivacyPolicy) -> MemoryFragment {
    let mut out = fragment.clone();

    for key in ALWAYS_STRIPPED {
        out.metadata.remove(key);
    }

    if policy.redact_participants {
        for key in PARTICIPANT_KEYS {
            out.metadata.remove(key);
        }
    }

    if policy.redact_conversation_id {
        if let Some(value) = out.metadata.get_mut(CONVERSATION_KEY) {
            *value = Value::String(redact_conversation_id(value));
        }
    }

    if policy.redact_timestamps {
        out.timestamp -= out.timestamp % DAY_MS;
    }

    out
}

fn redact_conversation_id(value: &Value) -> String {
    if let Value::String(s) = value {
        if is_redacted_token(s) {
            return s.clone();
        }
    }
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let digest = hex_prefix(&blake3_hash(raw.as_bytes()));
    format!("{REDACTED_PREFIX}{digest}")
}

/// Exactly the shape `redact_conversation_id` produces.
fn is_redacted_token(s: &str) -> bool {
    s.strip_prefix(REDACTED_PREFIX).is_some_and(|digest| {
        digest.len() == REDACTED_HEX_LEN
            && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}

fn hex_prefix(hash: &[u8; 32]) -> String {
    let mut hex = shared_types::hash_hex(hash);
    hex.truncate(REDACTED_HEX_LEN);
    hex
}
