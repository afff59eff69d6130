//! # Entropy Budget Tracker
//!
//! In-memory ledger per field. Check and consume are separate calls; writers
//! that need them to be atomic must serialise per field themselves.

use crate::domain::budget::{
    apply_cooling, entropy_budget, BudgetCheck, EntropyStatus, FieldLedger, WARNING_THRESHOLD,
};
use crate::ports::inbound::EntropyBudgetApi;
use mg_telemetry::metrics::ENTROPY_REJECTIONS;
use parking_lot::Mutex;
use shared_types::{FieldId, Scope, SecurityError, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct EntropyBudgetTracker {
    clock: Arc<dyn TimeSource>,
    fields: Mutex<HashMap<FieldId, FieldLedger>>,
}

impl EntropyBudgetTracker {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            clock,
            fields: Mutex::new(HashMap::new()),
        }
    }

    pub fn check_budget(&self, field_id: &str, scope: Scope, incoming: f64) -> BudgetCheck {
        let budget = entropy_budget(scope);
        let now = self.clock.now();

        let usage = {
            let mut fields = self.fields.lock();
            let ledger = fields
                .entry(field_id.to_string())
                .or_insert_with(|| FieldLedger::new(scope, now));
            ledger.scope = scope;
            apply_cooling(ledger, now);
            ledger.usage
        };
        let remaining = (budget.field_cap - usage).max(0.0);

        let rejection = if !incoming.is_finite() || incoming < 0.0 {
            Some(format!("incoming entropy {incoming} is not a non-negative number"))
        } else if incoming > budget.max_fragment_entropy {
            Some(format!(
                "fragment entropy {incoming:.3} exceeds per-fragment limit {:.1} for {scope}",
                budget.max_fragment_entropy
            ))
        } else if usage + incoming > budget.field_cap {
            Some(format!(
                "field usage {usage:.3} + {incoming:.3} exceeds cap {:.0} for {scope}",
                budget.field_cap
            ))
        } else {
            None
        };

        if let Some(reason) = rejection {
            ENTROPY_REJECTIONS.with_label_values(&[scope.as_str()]).inc();
            warn!(
                security_event = "entropy_budget_exceeded",
                field_id,
                scope = %scope,
                incoming,
                usage,
                "{reason}"
            );
            return BudgetCheck {
                allowed: false,
                current_usage: usage,
                budget_remaining: remaining,
                warning: None,
                reason: Some(reason),
            };
        }

        let projected = (usage + incoming) / budget.field_cap;
        let warning = (projected >= WARNING_THRESHOLD).then(|| {
            format!(
                "field {field_id} at {:.0}% of its entropy budget",
                projected * 100.0
            )
        });
        if let Some(message) = &warning {
            debug!(field_id, scope = %scope, "{message}");
        }

        BudgetCheck {
            allowed: true,
            current_usage: usage,
            budget_remaining: remaining,
            warning,
            reason: None,
        }
    }

    /// Commit entropy for a write that succeeded.
    ///
    /// Fails with `NotFound` for a field that was never checked.
    pub fn consume(&self, field_id: &str, entropy: f64) -> Result<EntropyStatus, SecurityError> {
        if !entropy.is_finite() || entropy < 0.0 {
            return Err(SecurityError::Validation(format!(
                "cannot consume entropy {entropy}"
            )));
        }
        let now = self.clock.now();
        let mut fields = self.fields.lock();
        let ledger = fields.get_mut(field_id).ok_or_else(|| {
            SecurityError::NotFound(format!("no entropy ledger for field {field_id}"))
        })?;
        apply_cooling(ledger, now);
        ledger.usage += entropy;
        Ok(EntropyStatus::from_ledger(field_id, ledger))
    }

    pub fn get_status(&self, field_id: &str) -> Option<EntropyStatus> {
        let now = self.clock.now();
        let mut fields = self.fields.lock();
        let ledger = fields.get_mut(field_id)?;
        apply_cooling(ledger, now);
        Some(EntropyStatus::from_ledger(field_id, ledger))
    }

    /// Drop the ledger of a deleted field.
    pub fn forget(&self, field_id: &str) -> bool {
        self.fields.lock().remove(field_id).is_some()
    }
}

impl EntropyBudgetApi for EntropyBudgetTracker {
    fn check_budget(&self, field_id: &str, scope: Scope, incoming: f64) -> BudgetCheck {
        EntropyBudgetTracker::check_budget(self, field_id, scope, incoming)
    }

    fn consume(&self, field_id: &str, entropy: f64) -> Result<EntropyStatus, SecurityError> {
        EntropyBudgetTracker::consume(self, field_id, entropy)
    }

    fn get_status(&self, field_id: &str) -> Option<EntropyStatus> {
        EntropyBudgetTracker::get_status(self, field_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ManualClock, HOUR_MS};

    fn tracker() -> (EntropyBudgetTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        (EntropyBudgetTracker::new(clock.clone()), clock)
    }

    #[test]
    fn test_per_fragment_limit() {
        let (tracker, _) = tracker();
        let check = tracker.check_budget("f", Scope::Conversation, 6.1);
        assert!(!check.allowed);
        assert!(check.reason.unwrap().contains("per-fragment"));

        assert!(tracker.check_budget("f", Scope::Global, 6.1).allowed);
    }

    #[test]
    fn test_field_cap_and_cooling() {
        let (tracker, clock) = tracker();
        for _ in 0..100 {
            assert!(tracker.check_budget("f", Scope::Conversation, 5.0).allowed);
            tracker.consume("f", 5.0).unwrap();
        }
        let full = tracker.check_budget("f", Scope::Conversation, 1.0);
        assert!(!full.allowed);
        assert_eq!(full.current_usage, 500.0);
        assert_eq!(full.budget_remaining, 0.0);

        clock.advance(HOUR_MS);
        let cooled = tracker.check_budget("f", Scope::Conversation, 1.0);
        assert!(cooled.allowed);
        assert!((cooled.current_usage - 450.0).abs() < 1e-9);
        assert!(cooled.warning.is_some());
    }

    #[test]
    fn test_rejected_check_does_not_consume() {
        let (tracker, _) = tracker();
        tracker.check_budget("f", Scope::User, 99.0);
        assert_eq!(tracker.get_status("f").unwrap().usage, 0.0);
    }

    #[test]
    fn test_consume_unknown_field() {
        let (tracker, _) = tracker();
        assert!(matches!(
            tracker.consume("missing", 1.0),
            Err(SecurityError::NotFound(_))
        ));
        assert!(tracker.get_status("missing").is_none());
    }

    #[test]
    fn test_invalid_incoming_rejected() {
        let (tracker, _) = tracker();
        assert!(!tracker.check_budget("f", Scope::User, f64::NAN).allowed);
        assert!(!tracker.check_budget("f", Scope::User, -1.0).allowed);
        assert!(matches!(
            tracker.consume("f", f64::INFINITY),
            Err(SecurityError::Validation(_))
        ));
    }

    #[test]
    fn test_status_and_forget() {
        let (tracker, _) = tracker();
        tracker.check_budget("f", Scope::Organization, 3.0);
        let status = tracker.consume("f", 3.0).unwrap();
        assert_eq!(status.cap, 10_000.0);
        assert_eq!(status.remaining, 9_997.0);
        assert!(tracker.forget("f"));
        assert!(tracker.get_status("f").is_none());
    }
}
