use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audit::{AuditContext, AuditSink};
use crate::config::AppConfig;
use crate::documents::{DocumentManager, NoopDocumentManager};
use crate::domain::master_data::PLACEHOLDER_ACTOR;
use crate::notice::Notice;
use crate::submission::{
    submit_guarded, CancelSignal, IntegrationMode, SubmissionEnvelope, SubmissionError,
    SubmissionGateway, SubmissionOutcome, SubmissionReceipt,
};
use crate::validation::FieldError;

use super::engine::{AdvancePolicy, WizardEngine, WizardTransitionError};
use super::form::WizardForm;
use super::states::{
    TransitionOutcome, WizardAction, WizardContext, WizardEvent, WizardPhase, WizardState,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardOptions {
    pub validate_on_advance: bool,
    pub integration_enabled: bool,
    pub gateway_timeout: Option<Duration>,
    pub correlation_id: String,
    pub actor: String,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self {
            validate_on_advance: false,
            integration_enabled: false,
            gateway_timeout: None,
            correlation_id: uuid::Uuid::new_v4().to_string(),
            actor: PLACEHOLDER_ACTOR.to_owned(),
        }
    }
}

impl WizardOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            validate_on_advance: config.wizard.validate_on_advance,
            integration_enabled: config.wizard.integration_enabled,
            gateway_timeout: config.gateway.timeout_ms.map(Duration::from_millis),
            actor: config.master_data.actor.clone(),
            ..Self::default()
        }
    }

    pub fn with_integration(mut self, integration_enabled: bool) -> Self {
        self.integration_enabled = integration_enabled;
        self
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error(transparent)]
    Transition(#[from] WizardTransitionError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("request is locked while a submission is pending or confirmed")]
    Locked,
}

/// Drives one request through its steps and the submission gateway.
pub struct WizardController<R: WizardForm> {
    engine: WizardEngine,
    options: WizardOptions,
    initial: R,
    request: R,
    state: WizardState,
    errors: Vec<FieldError>,
    notices: Vec<Notice>,
    receipt: Option<SubmissionReceipt>,
    documents: Arc<dyn DocumentManager>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl<R: WizardForm> WizardController<R> {
    pub fn new(mut request: R, options: WizardOptions) -> Self {
        request.recompute_derived();
        Self {
            engine: WizardEngine::new(AdvancePolicy::from_flag(options.validate_on_advance)),
            options,
            initial: request.clone(),
            request,
            state: WizardState::initial(),
            errors: Vec::new(),
            notices: Vec::new(),
            receipt: None,
            documents: Arc::new(NoopDocumentManager),
            audit: None,
        }
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentManager>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn request(&self) -> &R {
        &self.request
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn step(&self) -> u8 {
        self.state.step
    }

    pub fn total_steps(&self) -> u8 {
        self.request.total_steps()
    }

    pub fn step_title(&self) -> &'static str {
        self.request.step_title(self.state.step)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.step == self.request.total_steps()
    }

    pub fn is_confirmed(&self) -> bool {
        self.state.phase == WizardPhase::Confirmed
    }

    pub fn options(&self) -> &WizardOptions {
        &self.options
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.errors.iter().find(|error| error.field == field).map(|error| error.message.as_str())
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    /// Applies a field edit and recomputes derived fields.
    pub fn edit(&mut self, change: impl FnOnce(&mut R)) -> Result<(), WizardError> {
        if self.state.phase != WizardPhase::Editing {
            return Err(WizardError::Locked);
        }
        change(&mut self.request);
        self.request.recompute_derived();

        // Endorsements shrink from 5 to 4 steps when the change becomes nil.
        let total = self.request.total_steps();
        if self.state.step > total {
            self.state.step = total;
        }
        Ok(())
    }

    pub fn next(&mut self) -> Result<TransitionOutcome, WizardError> {
        let context = self.context();
        let outcome = self.apply(WizardEvent::Next, &context)?;
        self.errors.clear();

        if outcome.actions.contains(&WizardAction::OpenDocuments) {
            if let Some(document_step) = self.request.document_step() {
                info!(
                    event_name = "wizard.documents_opened",
                    correlation_id = %self.options.correlation_id,
                    process_type = document_step.process_type,
                    customer_id = self.request.customer_id(),
                    "document manager opened"
                );
                self.documents.open(document_step.process_type, self.request.customer_id());
            }
        }
        Ok(outcome)
    }

    pub fn prev(&mut self) -> Result<TransitionOutcome, WizardError> {
        let context = self.context();
        let outcome = self.apply(WizardEvent::Prev, &context)?;
        self.errors.clear();
        Ok(outcome)
    }

    /// Every field of the request, for the pre-submission summary.
    pub fn summary(&self) -> Value {
        serde_json::to_value(&self.request).unwrap_or(Value::Null)
    }

    /// Validates the whole request and submits it through `gateway`.
    ///
    /// Returns the receipt for integrated submissions and `None` for the
    /// manual path. Gateway failures leave the wizard editable on the same
    /// step with a single error notice.
    pub async fn submit<G>(
        &mut self,
        gateway: &G,
        signal: &CancelSignal,
    ) -> Result<Option<SubmissionReceipt>, WizardError>
    where
        G: SubmissionGateway + ?Sized,
    {
        let context = self.context();
        self.apply(WizardEvent::SubmitRequested, &context)?;
        self.errors.clear();

        let kind = self.request.kind();
        let envelope = match serde_json::to_value(&self.request) {
            Ok(payload) => SubmissionEnvelope {
                kind,
                subject_id: self.request.subject_id().to_owned(),
                correlation_id: self.options.correlation_id.clone(),
                mode: IntegrationMode::from_flag(self.options.integration_enabled),
                payload,
            },
            Err(error) => {
                return Err(self.fail(SubmissionError::Serialization(error.to_string())));
            }
        };

        info!(
            event_name = "wizard.submission_started",
            correlation_id = %self.options.correlation_id,
            request_kind = kind.as_str(),
            subject_id = %envelope.subject_id,
            integration_enabled = self.options.integration_enabled,
            "submitting request"
        );

        let in_flight = InFlight {
            state: &mut self.state,
            correlation_id: &self.options.correlation_id,
            armed: true,
        };
        let result = submit_guarded(gateway, envelope, signal, self.options.gateway_timeout).await;
        in_flight.settle();

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(error) => return Err(self.fail(error)),
        };

        let receipt = match outcome {
            SubmissionOutcome::Integrated { receipt } => {
                self.notices.push(Notice::success(format!(
                    "{} Reference: {}",
                    receipt.message, receipt.reference_number
                )));
                Some(receipt)
            }
            SubmissionOutcome::Manual { message } => {
                self.notices.push(Notice::success(message));
                None
            }
        };
        self.receipt = receipt.clone();

        let context = self.context();
        self.apply(WizardEvent::SubmissionSucceeded, &context)?;
        info!(
            event_name = "wizard.submission_completed",
            correlation_id = %self.options.correlation_id,
            request_kind = kind.as_str(),
            integrated = receipt.is_some(),
            "request submitted"
        );
        Ok(receipt)
    }

    /// Starts over with the defaults the controller was created with.
    pub fn reset(&mut self) -> Result<TransitionOutcome, WizardError> {
        let context = WizardContext::new(self.initial.total_steps());
        let outcome = self.apply(WizardEvent::Reset, &context)?;
        self.request = self.initial.clone();
        self.errors.clear();
        self.notices.clear();
        self.receipt = None;
        Ok(outcome)
    }

    fn fail(&mut self, error: SubmissionError) -> WizardError {
        let label = self.request.kind().label();
        let notice = match error {
            SubmissionError::Cancelled => {
                Notice::info(format!("Submission of {label} request was cancelled"))
            }
            _ => Notice::error(format!("Failed to submit {label} request")),
        };
        warn!(
            event_name = "wizard.submission_failed",
            correlation_id = %self.options.correlation_id,
            request_kind = self.request.kind().as_str(),
            error = %error,
            "request submission failed"
        );
        self.notices.push(notice);

        let context = self.context();
        if let Err(transition) = self.apply(WizardEvent::SubmissionFailed, &context) {
            return transition.into();
        }
        error.into()
    }

    fn context(&self) -> WizardContext {
        WizardContext {
            total_steps: self.request.total_steps(),
            document_step: self.request.document_step().map(|document| document.step),
            step_errors: self.request.validate_step(self.state.step),
            form_errors: self.request.all_errors(),
        }
    }

    fn apply(
        &mut self,
        event: WizardEvent,
        context: &WizardContext,
    ) -> Result<TransitionOutcome, WizardTransitionError> {
        let result = match &self.audit {
            Some(sink) => self.engine.apply_with_audit(
                &self.state,
                &event,
                context,
                sink.as_ref(),
                &AuditContext::new(
                    Some(self.request.subject_id().to_owned()),
                    self.options.correlation_id.clone(),
                    self.options.actor.clone(),
                ),
            ),
            None => self.engine.apply(&self.state, &event, context),
        };

        match &result {
            Ok(outcome) => {
                debug!(
                    event_name = "wizard.transition_applied",
                    correlation_id = %self.options.correlation_id,
                    from_step = outcome.from.step,
                    to_step = outcome.to.step,
                    event = ?outcome.event,
                    "wizard transition applied"
                );
                self.state = outcome.to;
            }
            Err(error) => {
                debug!(
                    event_name = "wizard.transition_rejected",
                    correlation_id = %self.options.correlation_id,
                    error = %error,
                    "wizard transition rejected"
                );
                self.errors = error.field_errors().to_vec();
            }
        }
        result
    }
}

/// Restores editing on the same step if a submission future is dropped
/// before the gateway answers.
struct InFlight<'a> {
    state: &'a mut WizardState,
    correlation_id: &'a str,
    armed: bool,
}

impl InFlight<'_> {
    fn settle(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed && self.state.phase == WizardPhase::Submitting {
            warn!(
                event_name = "wizard.submission_abandoned",
                correlation_id = %self.correlation_id,
                step = self.state.step,
                "submission dropped before the gateway answered"
            );
            self.state.phase = WizardPhase::Editing;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rust_decimal::Decimal;

    use crate::audit::InMemoryAuditSink;
    use crate::derived::PremiumBreakdown;
    use crate::documents::RecordingDocumentManager;
    use crate::domain::cancellation::{CancellationReason, CancellationRequest, RefundMode};
    use crate::domain::endorsement::{EndorsedField, EndorsementChange, EndorsementRequest};
    use crate::notice::NoticeLevel;
    use crate::submission::{
        cancel_pair, CancelSignal, SimulatedGateway, SubmissionError, SubmissionStatus,
    };
    use crate::wizard::{WizardError, WizardPhase, WizardTransitionError};

    use super::{WizardController, WizardOptions};

    fn cancellation() -> CancellationRequest {
        CancellationRequest {
            policy_number: "POL-MTR-2024-000123".to_owned(),
            customer_id: "CUST-1001".to_owned(),
            customer_name: "Asha Verma".to_owned(),
            policy_start_date: "2024-04-01".to_owned(),
            policy_end_date: "2025-03-31".to_owned(),
            cancellation_reason: Some(CancellationReason::VehicleSold),
            cancellation_date: "2024-09-15".to_owned(),
            effective_date: "2024-09-16".to_owned(),
            total_premium_paid: Decimal::new(10_000, 0),
            premium_deduction: Decimal::new(1_500, 0),
            refund_mode: Some(RefundMode::SourceAccount),
            ..CancellationRequest::default()
        }
    }

    fn options(integration_enabled: bool) -> WizardOptions {
        WizardOptions {
            integration_enabled,
            correlation_id: "req-test".to_owned(),
            ..WizardOptions::default()
        }
    }

    #[test]
    fn next_and_prev_stay_within_bounds() {
        let mut wizard = WizardController::new(CancellationRequest::default(), options(false));

        assert!(wizard.prev().expect("prev at first step").is_noop());
        for _ in 0..6 {
            wizard.next().expect("advance without validation");
        }
        assert_eq!(wizard.step(), 4);
        assert!(wizard.is_terminal());
        assert_eq!(wizard.step_title(), "Review & Submit");

        wizard.prev().expect("back");
        assert_eq!(wizard.step(), 3);
    }

    #[test]
    fn validate_on_advance_blocks_and_exposes_field_errors() {
        let options = WizardOptions { validate_on_advance: true, ..options(false) };
        let mut wizard = WizardController::new(CancellationRequest::default(), options);

        let error = wizard.next().expect_err("empty first step");
        assert!(matches!(
            error,
            WizardError::Transition(WizardTransitionError::StepInvalid { step: 1, .. })
        ));
        assert_eq!(wizard.step(), 1);
        assert_eq!(wizard.field_error("policy_number"), Some("Policy number is required"));

        wizard.edit(|request| *request = cancellation()).expect("edit while editing");
        wizard.next().expect("valid first step");
        assert_eq!(wizard.step(), 2);
        assert!(wizard.errors().is_empty());
    }

    #[test]
    fn edits_recompute_refund() {
        let mut wizard = WizardController::new(cancellation(), options(false));
        assert_eq!(wizard.request().refund_amount, Decimal::new(8_500, 0));

        wizard.edit(|request| request.premium_deduction = Decimal::new(2_000, 0)).expect("edit");
        assert_eq!(wizard.request().refund_amount, Decimal::new(8_000, 0));
    }

    #[test]
    fn leaving_document_step_opens_document_manager_once() {
        let documents = RecordingDocumentManager::default();
        let mut wizard = WizardController::new(cancellation(), options(false))
            .with_documents(Arc::new(documents.clone()));

        wizard.next().expect("1 -> 2");
        assert!(documents.sessions().is_empty());
        wizard.next().expect("2 -> 3");
        wizard.prev().expect("3 -> 2");
        wizard.next().expect("2 -> 3 again");

        let sessions = documents.sessions();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].process_type, "CANCELLATION");
        assert_eq!(sessions[0].customer_id, "CUST-1001");
    }

    #[tokio::test(start_paused = true)]
    async fn integrated_submission_returns_receipt_and_confirms() {
        let mut wizard = WizardController::new(cancellation(), options(true));

        let receipt = wizard
            .submit(&SimulatedGateway::default(), &CancelSignal::never())
            .await
            .expect("submission succeeds")
            .expect("integrated path returns a receipt");

        assert_eq!(receipt.status, SubmissionStatus::Submitted);
        assert_eq!(receipt.status.as_str(), "SUBMITTED");
        assert!(!receipt.next_steps.is_empty());
        assert!(receipt.to_json().get("cancellationId").is_some());
        assert!(wizard.is_terminal());
        assert!(wizard.is_confirmed());
        assert_eq!(wizard.receipt(), Some(&receipt));
        assert_eq!(wizard.notices()[0].level, NoticeLevel::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submission_has_no_receipt_but_reaches_terminal_step() {
        let mut wizard = WizardController::new(cancellation(), options(false));

        let receipt = wizard
            .submit(&SimulatedGateway::default(), &CancelSignal::never())
            .await
            .expect("manual submission succeeds");

        assert!(receipt.is_none());
        assert!(wizard.receipt().is_none());
        assert_eq!(wizard.step(), 4);
        assert!(wizard.is_confirmed());
        assert_eq!(wizard.notices().len(), 1);
        assert_eq!(wizard.notices()[0].level, NoticeLevel::Success);
        assert!(wizard.notices()[0].message.contains("manual processing"));
    }

    #[tokio::test]
    async fn gateway_failure_keeps_step_and_data() {
        let mut wizard = WizardController::new(cancellation(), options(true));
        wizard.next().expect("1 -> 2");
        let before = wizard.request().clone();

        let error = wizard
            .submit(&SimulatedGateway::instant().failing("insurer offline"), &CancelSignal::never())
            .await
            .expect_err("gateway fails");

        assert!(matches!(error, WizardError::Submission(SubmissionError::Rejected(_))));
        assert_eq!(wizard.step(), 2);
        assert_eq!(wizard.state().phase, WizardPhase::Editing);
        assert_eq!(wizard.request(), &before);
        assert_eq!(wizard.notices()[0].level, NoticeLevel::Error);
        assert_eq!(wizard.notices()[0].message, "Failed to submit cancellation request");
    }

    #[tokio::test]
    async fn invalid_request_is_not_dispatched() {
        let mut wizard = WizardController::new(CancellationRequest::default(), options(true));

        let error = wizard
            .submit(&SimulatedGateway::instant(), &CancelSignal::never())
            .await
            .expect_err("empty request");

        assert!(matches!(
            error,
            WizardError::Transition(WizardTransitionError::FormInvalid { .. })
        ));
        assert!(wizard.notices().is_empty());
        assert!(wizard.field_error("refund_mode").is_some());
        assert_eq!(wizard.state().phase, WizardPhase::Editing);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_submission_returns_to_editing_with_info_notice() {
        let mut wizard = WizardController::new(cancellation(), options(true));
        let (handle, signal) = cancel_pair();

        let cancel = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            drop(handle);
        };
        let gateway = SimulatedGateway::default();
        let (result, ()) = tokio::join!(wizard.submit(&gateway, &signal), cancel);

        assert_eq!(result, Err(WizardError::Submission(SubmissionError::Cancelled)));
        assert_eq!(wizard.state().phase, WizardPhase::Editing);
        assert_eq!(wizard.notices()[0].level, NoticeLevel::Info);
        assert!(wizard.receipt().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_submission_leaves_wizard_editable() {
        let mut wizard = WizardController::new(cancellation(), options(true));
        let gateway = SimulatedGateway::default();

        let timed_out = tokio::time::timeout(
            Duration::from_millis(100),
            wizard.submit(&gateway, &CancelSignal::never()),
        )
        .await;

        assert!(timed_out.is_err());
        assert_eq!(wizard.state().phase, WizardPhase::Editing);
        assert_eq!(wizard.step(), 1);
        assert_eq!(wizard.request().policy_number, "POL-MTR-2024-000123");
        assert_eq!(wizard.request().refund_amount, Decimal::new(8_500, 0));
        wizard.edit(|request| request.remarks = "retry".to_owned()).expect("editable again");

        let receipt = wizard
            .submit(&SimulatedGateway::instant(), &CancelSignal::never())
            .await
            .expect("resubmitted");
        assert!(receipt.is_some());
        assert!(wizard.is_confirmed());

        wizard.reset().expect("submit another");
        assert_eq!(wizard.step(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_recovers_after_dropped_submission() {
        let mut wizard = WizardController::new(cancellation(), options(false));
        let gateway = SimulatedGateway::default();

        let _ = tokio::time::timeout(
            Duration::from_millis(50),
            wizard.submit(&gateway, &CancelSignal::never()),
        )
        .await;

        wizard.edit(|request| request.remarks = "abandoned".to_owned()).expect("editable");
        wizard.reset().expect("reset after drop");
        assert_eq!(wizard.state().phase, WizardPhase::Editing);
        assert!(wizard.request().remarks.is_empty());
        assert!(wizard.receipt().is_none());
    }

    #[tokio::test]
    async fn confirmed_request_is_locked_until_reset() {
        let mut wizard = WizardController::new(CancellationRequest::default(), options(false));
        wizard.edit(|request| *request = cancellation()).expect("fill in");
        wizard
            .submit(&SimulatedGateway::instant(), &CancelSignal::never())
            .await
            .expect("submitted");

        let locked = wizard.edit(|request| request.remarks = "late".to_owned());
        assert_eq!(locked, Err(WizardError::Locked));

        wizard.reset().expect("submit another");
        assert_eq!(wizard.step(), 1);
        assert_eq!(wizard.request(), &CancellationRequest::default());
        assert!(wizard.notices().is_empty());
        assert!(wizard.receipt().is_none());
    }

    #[test]
    fn switching_endorsement_to_nil_clamps_step() {
        let request = EndorsementRequest {
            endorsed_field: Some(EndorsedField::Nominee),
            change: EndorsementChange::NonNil {
                premium: PremiumBreakdown::new(Decimal::new(500, 0)),
            },
            ..EndorsementRequest::default()
        };
        let mut wizard = WizardController::new(request, options(false));
        for _ in 0..4 {
            wizard.next().expect("advance");
        }
        assert_eq!(wizard.step(), 5);

        wizard.edit(|request| request.change = EndorsementChange::Nil).expect("make nil");
        assert_eq!(wizard.total_steps(), 4);
        assert_eq!(wizard.step(), 4);
    }

    #[test]
    fn transitions_are_audited_when_a_sink_is_attached() {
        let sink = InMemoryAuditSink::default();
        let mut wizard = WizardController::new(cancellation(), options(false))
            .with_audit(Arc::new(sink.clone()));

        wizard.next().expect("advance");

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "wizard.transition_applied");
        assert_eq!(events[0].correlation_id, "req-test");
        assert_eq!(events[0].request_id.as_deref(), Some("POL-MTR-2024-000123"));
    }
}
