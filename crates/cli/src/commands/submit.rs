use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use covernote_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use covernote_core::domain::approval::InsuranceApprovalRequest;
use covernote_core::domain::cancellation::CancellationRequest;
use covernote_core::domain::endorsement::EndorsementRequest;
use covernote_core::domain::proposal::ProposalRequest;
use covernote_core::domain::request::RequestKind;
use covernote_core::domain::settlement::SettlementRequest;
use covernote_core::domain::verification::Verification64VbRequest;
use covernote_core::errors::ApplicationError;
use covernote_core::notice::Notice;
use covernote_core::submission::{CancelSignal, SimulatedGateway, SubmissionGateway};
use covernote_core::validation::FieldError;
use covernote_core::wizard::{WizardController, WizardError, WizardForm, WizardOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::commands::{runtime, CommandResult};

#[derive(Debug, Serialize)]
pub struct SubmitReport {
    pub kind: &'static str,
    pub subject_id: String,
    pub steps: u8,
    pub integrated: bool,
    pub receipt: Option<Value>,
    pub notices: Vec<Notice>,
}

#[derive(Debug)]
pub struct SubmitRejection {
    pub error: WizardError,
    pub field_errors: Vec<FieldError>,
    pub notices: Vec<Notice>,
}

pub fn run(kind: RequestKind, file: &Path, integration: bool) -> CommandResult {
    let overrides = ConfigOverrides {
        integration_enabled: integration.then_some(true),
        ..ConfigOverrides::default()
    };
    let config = match AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "submit",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let raw = match read_request(file) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure("submit", "request_input", format!("{error:#}"), 2);
        }
    };

    let runtime = match runtime("submit") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let gateway = SimulatedGateway::from_config(&config.gateway);
    let options = WizardOptions::from_config(&config);
    let correlation_id = options.correlation_id.clone();
    let outcome = runtime.block_on(submit_kind(kind, &raw, options, &gateway));

    match outcome {
        Ok(Ok(report)) => {
            let message = report
                .notices
                .last()
                .map(|notice| notice.message.clone())
                .unwrap_or_else(|| format!("{} request submitted", kind.label()));
            let data = serde_json::to_value(&report).ok();
            CommandResult::success_with_data("submit", message, data)
        }
        Ok(Err(SubmitRejection { error, field_errors, notices })) => {
            let (error_class, exit_code) = match error {
                WizardError::Submission(_) => ("submission", 4),
                WizardError::Transition(_) | WizardError::Locked => ("validation", 3),
            };
            let message = error.to_string();
            let interface = ApplicationError::from(error).into_interface(correlation_id);
            let data = serde_json::json!({
                "user_message": interface.user_message(),
                "correlation_id": interface.correlation_id(),
                "field_errors": field_errors,
                "notices": notices,
            });
            CommandResult::failure_with_data("submit", error_class, message, exit_code, Some(data))
        }
        Err(error) => CommandResult::failure("submit", "request_input", format!("{error:#}"), 2),
    }
}

fn read_request(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("could not read request file `{}`", path.display()))
}

async fn submit_kind<G>(
    kind: RequestKind,
    raw: &str,
    options: WizardOptions,
    gateway: &G,
) -> Result<Result<SubmitReport, SubmitRejection>>
where
    G: SubmissionGateway + ?Sized,
{
    match kind {
        RequestKind::Verification64Vb => {
            Ok(drive(parse::<Verification64VbRequest>(kind, raw)?, options, gateway).await)
        }
        RequestKind::Cancellation => {
            Ok(drive(parse::<CancellationRequest>(kind, raw)?, options, gateway).await)
        }
        RequestKind::InsuranceApproval => {
            Ok(drive(parse::<InsuranceApprovalRequest>(kind, raw)?, options, gateway).await)
        }
        RequestKind::Settlement => {
            Ok(drive(parse::<SettlementRequest>(kind, raw)?, options, gateway).await)
        }
        RequestKind::Endorsement => {
            Ok(drive(parse::<EndorsementRequest>(kind, raw)?, options, gateway).await)
        }
        RequestKind::Proposal => {
            Ok(drive(parse::<ProposalRequest>(kind, raw)?, options, gateway).await)
        }
    }
}

fn parse<R: DeserializeOwned>(kind: RequestKind, raw: &str) -> Result<R> {
    serde_json::from_str(raw)
        .with_context(|| format!("request file is not a valid {} request", kind.label()))
}

/// Walks every step, then submits. Field errors surface at the step that owns them
/// when `validate_on_advance` is on, otherwise at submission.
pub async fn drive<R, G>(
    request: R,
    options: WizardOptions,
    gateway: &G,
) -> Result<SubmitReport, SubmitRejection>
where
    R: WizardForm,
    G: SubmissionGateway + ?Sized,
{
    let integrated = options.integration_enabled;
    let mut wizard = WizardController::new(request, options);

    while !wizard.is_terminal() {
        if let Err(error) = wizard.next() {
            return Err(rejected(&mut wizard, error));
        }
    }

    let receipt = match wizard.submit(gateway, &CancelSignal::never()).await {
        Ok(receipt) => receipt,
        Err(error) => return Err(rejected(&mut wizard, error)),
    };

    Ok(SubmitReport {
        kind: wizard.request().kind().as_str(),
        subject_id: wizard.request().subject_id().to_owned(),
        steps: wizard.total_steps(),
        integrated,
        receipt: receipt.map(|receipt| receipt.to_json()),
        notices: wizard.take_notices(),
    })
}

fn rejected<R: WizardForm>(
    wizard: &mut WizardController<R>,
    error: WizardError,
) -> SubmitRejection {
    let field_errors = wizard.errors().to_vec();
    SubmitRejection { error, field_errors, notices: wizard.take_notices() }
}

#[cfg(test)]
mod tests {
    use covernote_core::domain::cancellation::CancellationRequest;
    use covernote_core::notice::NoticeLevel;
    use covernote_core::submission::SimulatedGateway;
    use covernote_core::wizard::WizardOptions;

    use super::{drive, parse};
    use covernote_core::domain::request::RequestKind;

    const CANCELLATION: &str = r#"{
        "policy_number": "POL-MTR-2024-000123",
        "customer_id": "CUST-1001",
        "customer_name": "Anita Sharma",
        "policy_start_date": "2024-04-01",
        "policy_end_date": "2025-03-31",
        "cancellation_reason": "vehicle_sold",
        "cancellation_date": "2024-09-15",
        "effective_date": "2024-09-16",
        "total_premium_paid": "10000",
        "premium_deduction": "1500",
        "refund_mode": "bank_transfer"
    }"#;

    #[tokio::test]
    async fn integrated_submission_reports_receipt() {
        let request = parse::<CancellationRequest>(RequestKind::Cancellation, CANCELLATION)
            .expect("valid request");
        let options = WizardOptions::default().with_integration(true);

        let report = drive(request, options, &SimulatedGateway::instant())
            .await
            .expect("submitted");

        let receipt = report.receipt.expect("integrated receipt");
        assert_eq!(receipt["status"], "SUBMITTED");
        assert!(receipt["cancellationId"].is_string());
        assert_eq!(report.steps, 4);
        assert_eq!(report.notices[0].level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn missing_fields_are_reported_without_dispatch() {
        let request = parse::<CancellationRequest>(RequestKind::Cancellation, "{}")
            .expect("defaults fill every field");

        let rejection = drive(request, WizardOptions::default(), &SimulatedGateway::instant())
            .await
            .expect_err("empty request is rejected");

        assert!(rejection.field_errors.iter().any(|error| error.field == "policy_number"));
        assert!(rejection.notices.is_empty());
    }

    #[test]
    fn malformed_json_names_the_request_kind() {
        let error = parse::<CancellationRequest>(RequestKind::Cancellation, "[1, 2")
            .expect_err("malformed");

        assert!(error.to_string().contains("cancellation"));
    }
}
