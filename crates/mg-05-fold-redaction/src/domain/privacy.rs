use serde::{Deserialize, Serialize};

/// Privacy options applied to a fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyPolicy {
    pub redact_conversation_id: bool,
    pub redact_participants: bool,
    pub redact_timestamps: bool,
    /// Carry the source provenance history onto the folded copy.
    pub preserve_provenance: bool,
}

impl Default for PrivacyPolicy {
    fn default() -> Self {
        Self {
            redact_conversation_id: true,
            redact_participants: true,
            redact_timestamps: false,
            preserve_provenance: true,
        }
    }
}

impl PrivacyPolicy {
    /// No optional redaction. The always-stripped keys still go.
    pub fn minimal() -> Self {
        Self {
            redact_conversation_id: false,
            redact_participants: false,
            redact_timestamps: false,
            preserve_provenance: true,
        }
    }

    pub fn with_redact_timestamps(mut self, enabled: bool) -> Self {
        self.redact_timestamps = enabled;
        self
    }

    pub fn with_preserve_provenance(mut self, enabled: bool) -> Self {
        self.preserve_provenance = enabled;
        self
    }
}
