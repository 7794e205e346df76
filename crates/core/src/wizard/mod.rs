pub mod controller;
pub mod engine;
pub mod form;
pub mod states;

pub use controller::{WizardController, WizardError, WizardOptions};
pub use engine::{AdvancePolicy, WizardEngine, WizardTransitionError};
pub use form::WizardForm;
pub use states::{
    TransitionOutcome, WizardAction, WizardContext, WizardEvent, WizardPhase, WizardState,
};
