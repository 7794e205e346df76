use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::validation::{FieldError, ValidationErrors};
use crate::wizard::states::{
    TransitionOutcome, WizardAction, WizardContext, WizardEvent, WizardPhase, WizardState,
};

/// Whether `Next` checks the fields of the step being left.
///
/// Under `Unconditional` only the final submission validates the whole form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
    #[default]
    Unconditional,
    ValidateCurrentStep,
}

impl AdvancePolicy {
    pub fn from_flag(validate_on_advance: bool) -> Self {
        if validate_on_advance {
            Self::ValidateCurrentStep
        } else {
            Self::Unconditional
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardTransitionError {
    #[error("step {step} has invalid fields: {errors}")]
    StepInvalid { step: u8, errors: ValidationErrors },
    #[error("request cannot be submitted: {errors}")]
    FormInvalid { errors: ValidationErrors },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: WizardState, event: WizardEvent },
}

impl WizardTransitionError {
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::StepInvalid { errors, .. } | Self::FormInvalid { errors } => errors.errors(),
            Self::InvalidTransition { .. } => &[],
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct WizardEngine {
    policy: AdvancePolicy,
}

impl WizardEngine {
    pub fn new(policy: AdvancePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AdvancePolicy {
        self.policy
    }

    pub fn apply(
        &self,
        current: &WizardState,
        event: &WizardEvent,
        context: &WizardContext,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        transition(self.policy, current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &WizardState,
        event: &WizardEvent,
        context: &WizardContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, WizardTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit.request_id.clone(),
                        audit.correlation_id.clone(),
                        "wizard.transition_applied",
                        AuditCategory::Wizard,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("from_step", outcome.from.step.to_string())
                    .with_metadata("to_step", outcome.to.step.to_string())
                    .with_metadata("to_phase", format!("{:?}", outcome.to.phase))
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.request_id.clone(),
                        audit.correlation_id.clone(),
                        "wizard.transition_rejected",
                        AuditCategory::Wizard,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

fn transition(
    policy: AdvancePolicy,
    current: &WizardState,
    event: &WizardEvent,
    context: &WizardContext,
) -> Result<TransitionOutcome, WizardTransitionError> {
    use WizardAction::{
        ClearForm, DispatchSubmission, OpenDocuments, ShowConfirmation, ShowErrorNotice,
    };
    use WizardEvent::{Next, Prev, Reset, SubmissionFailed, SubmissionSucceeded, SubmitRequested};
    use WizardPhase::{Confirmed, Editing, Submitting};

    let step = current.step;
    let (to, actions) = match (current.phase, event) {
        (Editing, Next) => {
            if step >= context.total_steps {
                (*current, Vec::new())
            } else {
                if policy == AdvancePolicy::ValidateCurrentStep && !context.step_errors.is_empty()
                {
                    return Err(WizardTransitionError::StepInvalid {
                        step,
                        errors: ValidationErrors::from(context.step_errors.clone()),
                    });
                }
                let actions = if context.document_step == Some(step) {
                    vec![OpenDocuments]
                } else {
                    Vec::new()
                };
                (WizardState { step: step + 1, phase: Editing }, actions)
            }
        }
        (Editing, Prev) => {
            if step <= 1 {
                (*current, Vec::new())
            } else {
                (WizardState { step: step - 1, phase: Editing }, Vec::new())
            }
        }
        (Editing, SubmitRequested) => {
            if !context.form_errors.is_empty() {
                return Err(WizardTransitionError::FormInvalid {
                    errors: ValidationErrors::from(context.form_errors.clone()),
                });
            }
            (WizardState { step, phase: Submitting }, vec![DispatchSubmission])
        }
        (Submitting, SubmissionSucceeded) => {
            (WizardState { step: context.total_steps, phase: Confirmed }, vec![ShowConfirmation])
        }
        (Submitting, SubmissionFailed) => {
            (WizardState { step, phase: Editing }, vec![ShowErrorNotice])
        }
        (Editing, Reset) | (Submitting, Reset) | (Confirmed, Reset) => {
            (WizardState::initial(), vec![ClearForm])
        }
        _ => {
            return Err(WizardTransitionError::InvalidTransition {
                state: *current,
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: event.clone(), actions })
}
