use serde::Serialize;

use crate::documents::DocumentStep;
use crate::domain::request::RequestKind;
use crate::validation::{FieldError, ValidationErrors};

/// A request record driven through the wizard.
pub trait WizardForm: Clone + Serialize + Send + Sync + 'static {
    fn kind(&self) -> RequestKind;

    fn total_steps(&self) -> u8;

    fn step_title(&self, step: u8) -> &'static str;

    /// Errors for the fields collected on `step`; steps without inputs return none.
    fn validate_step(&self, step: u8) -> Vec<FieldError>;

    /// Recomputes every derived field from its inputs. Must be idempotent.
    fn recompute_derived(&mut self) {}

    /// Business identifier shown in messages (policy number, claim id, ...).
    fn subject_id(&self) -> &str;

    fn customer_id(&self) -> &str;

    fn document_step(&self) -> Option<DocumentStep> {
        None
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationErrors::check(self.all_errors())
    }

    fn all_errors(&self) -> Vec<FieldError> {
        (1..=self.total_steps()).flat_map(|step| self.validate_step(step)).collect()
    }
}
