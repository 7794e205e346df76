use serde::{Deserialize, Serialize};

use crate::validation::FieldError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardPhase {
    Editing,
    Submitting,
    Confirmed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub step: u8,
    pub phase: WizardPhase,
}

impl WizardState {
    pub fn initial() -> Self {
        Self { step: 1, phase: WizardPhase::Editing }
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::initial()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardEvent {
    Next,
    Prev,
    SubmitRequested,
    SubmissionSucceeded,
    SubmissionFailed,
    Reset,
}

/// Facts about the request the transition table needs but cannot compute itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardContext {
    pub total_steps: u8,
    pub document_step: Option<u8>,
    pub step_errors: Vec<FieldError>,
    pub form_errors: Vec<FieldError>,
}

impl WizardContext {
    pub fn new(total_steps: u8) -> Self {
        Self { total_steps, document_step: None, step_errors: Vec::new(), form_errors: Vec::new() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardAction {
    OpenDocuments,
    DispatchSubmission,
    ShowConfirmation,
    ShowErrorNotice,
    ClearForm,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: WizardState,
    pub to: WizardState,
    pub event: WizardEvent,
    pub actions: Vec<WizardAction>,
}

impl TransitionOutcome {
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.actions.is_empty()
    }
}
