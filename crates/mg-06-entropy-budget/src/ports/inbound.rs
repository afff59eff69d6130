use crate::domain::budget::{BudgetCheck, EntropyStatus};
use shared_types::{Scope, SecurityError};

pub trait EntropyBudgetApi: Send + Sync {
    /// Apply cooling, then decide whether `incoming` fits.
    fn check_budget(&self, field_id: &str, scope: Scope, incoming: f64) -> BudgetCheck;

    /// Commit `entropy` against a field previously checked.
    fn consume(&self, field_id: &str, entropy: f64) -> Result<EntropyStatus, SecurityError>;

    fn get_status(&self, field_id: &str) -> Option<EntropyStatus>;
}
