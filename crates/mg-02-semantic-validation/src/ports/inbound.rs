//! # Inbound Ports (Driving Ports / API)

use crate::domain::scoring::SemanticValidation;
use shared_types::{MemoryFragment, Scope, SecurityError};

pub trait SemanticValidationApi: Send + Sync {
    /// Score `fragment` against `field_signature` under `scope`'s thresholds.
    fn validate(
        &self,
        fragment: &MemoryFragment,
        field_signature: &[f64],
        scope: Scope,
    ) -> Result<SemanticValidation, SecurityError>;

    /// `validate`, then apply the scope's enforcement mode.
    ///
    /// # Errors
    /// - `Validation` if the floor is missed in a strict scope, or the
    ///   fragment's numeric fields are out of range
    fn enforce(
        &self,
        fragment: &MemoryFragment,
        field_signature: &[f64],
        scope: Scope,
    ) -> Result<SemanticValidation, SecurityError>;
}
