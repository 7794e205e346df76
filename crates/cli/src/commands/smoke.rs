use std::future::Future;
use std::time::Instant;

use covernote_core::config::{AppConfig, LoadOptions};
use covernote_core::domain::cancellation::{CancellationReason, CancellationRequest, RefundMode};
use covernote_core::domain::master_data::{AuditStamp, Bank, Exam, ExamLevel};
use covernote_core::ids::{EntityId, IdStrategy};
use covernote_core::master_data::{DeleteOutcome, MasterDataTable, RecordRepository};
use covernote_core::submission::SimulatedGateway;
use covernote_core::wizard::{WizardController, WizardOptions};
use covernote_db::MasterDataRepositories;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::submit::drive;
use crate::commands::CommandResult;

const CHECKS_AFTER_CONFIG: [&str; 5] = [
    "refund_derivation",
    "integrated_submission",
    "manual_submission",
    "minimum_marks",
    "master_data_delete",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(LoadOptions::default())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.extend(CHECKS_AFTER_CONFIG.into_iter().map(skipped));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let mut pending = CHECKS_AFTER_CONFIG.into_iter();
            if let Some(name) = pending.next() {
                checks.push(SmokeCheck {
                    name,
                    status: SmokeStatus::Fail,
                    elapsed_ms: 0,
                    message: format!("failed to initialize async runtime: {error}"),
                });
            }
            checks.extend(pending.map(skipped));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let options = WizardOptions::from_config(&config);
    let actor = config.master_data.actor.clone();
    let strategy = config.master_data.id_strategy;

    runtime.block_on(async {
        checks.push(timed("refund_derivation", async { refund_derivation(&options) }).await);
        checks.push(
            timed("integrated_submission", integrated_submission(options.clone())).await,
        );
        checks.push(timed("manual_submission", manual_submission(options.clone())).await);
        checks.push(timed("minimum_marks", minimum_marks(strategy, &actor)).await);
        checks.push(timed("master_data_delete", master_data_delete(strategy, &actor)).await);
    });

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

fn sample_cancellation() -> CancellationRequest {
    CancellationRequest {
        policy_number: "POL-SMOKE-0001".to_string(),
        customer_id: "CUST-SMOKE".to_string(),
        customer_name: "Smoke Check".to_string(),
        policy_start_date: "2024-04-01".to_string(),
        policy_end_date: "2025-03-31".to_string(),
        cancellation_reason: Some(CancellationReason::CustomerRequest),
        cancellation_date: "2024-09-15".to_string(),
        effective_date: "2024-09-16".to_string(),
        total_premium_paid: Decimal::new(10_000, 0),
        premium_deduction: Decimal::new(1_500, 0),
        refund_mode: Some(RefundMode::SourceAccount),
        ..CancellationRequest::default()
    }
}

fn refund_derivation(options: &WizardOptions) -> Result<String, String> {
    let wizard = WizardController::new(sample_cancellation(), options.clone());
    let refund = wizard.request().refund_amount;
    if refund == Decimal::new(8_500, 0) {
        Ok(format!("refund derived as {refund}"))
    } else {
        Err(format!("expected refund 8500, derived {refund}"))
    }
}

async fn integrated_submission(options: WizardOptions) -> Result<String, String> {
    let report = drive(sample_cancellation(), options.with_integration(true), &instant_gateway())
        .await
        .map_err(|rejection| rejection.error.to_string())?;

    let receipt = report.receipt.ok_or_else(|| "integrated path returned no receipt".to_string())?;
    let has_next_steps =
        receipt["nextSteps"].as_array().is_some_and(|next_steps| !next_steps.is_empty());
    if receipt["status"] != "SUBMITTED" || !has_next_steps {
        return Err(format!("unexpected receipt shape: {receipt}"));
    }
    Ok(format!("receipt {} issued", receipt["referenceNumber"]))
}

async fn manual_submission(options: WizardOptions) -> Result<String, String> {
    let report = drive(sample_cancellation(), options.with_integration(false), &instant_gateway())
        .await
        .map_err(|rejection| rejection.error.to_string())?;

    match report.receipt {
        None => Ok(format!("manual path completed after {} steps", report.steps)),
        Some(receipt) => Err(format!("manual path unexpectedly returned {receipt}")),
    }
}

async fn minimum_marks(strategy: IdStrategy, actor: &str) -> Result<String, String> {
    let seeded = MasterDataRepositories::seed(strategy).await.map_err(|error| error.to_string())?;
    let mut table = MasterDataTable::<Exam>::new(seeded.repositories.exams.clone(), actor);

    let exam = Exam {
        id: EntityId::new(""),
        exam_name: "Smoke Assessment".to_string(),
        exam_code: "SMOKE-100".to_string(),
        level: ExamLevel::Basic,
        total_marks: 100,
        minimum_percentage: Decimal::new(60, 0),
        minimum_marks: 0,
        duration_minutes: 30,
        is_active: true,
        audit: AuditStamp::default(),
    };
    let created = table.create(exam).await.map_err(|error| error.to_string())?;

    if created.minimum_marks == 60 {
        Ok(format!("exam {} stored with minimum marks 60", created.id))
    } else {
        Err(format!("expected minimum marks 60, derived {}", created.minimum_marks))
    }
}

async fn master_data_delete(strategy: IdStrategy, actor: &str) -> Result<String, String> {
    let seeded = MasterDataRepositories::seed(strategy).await.map_err(|error| error.to_string())?;
    let banks = seeded.repositories.banks.clone();
    let before = banks.count().await.map_err(|error| error.to_string())?;
    let target = banks
        .list()
        .await
        .map_err(|error| error.to_string())?
        .first()
        .map(|bank| bank.id.clone())
        .ok_or_else(|| "bank fixture is empty".to_string())?;

    let mut table = MasterDataTable::<Bank>::new(banks.clone(), actor);
    let confirm = |_: &str| true;
    match table.delete(&target, &confirm).await.map_err(|error| error.to_string())? {
        DeleteOutcome::Deleted(_) => {}
        DeleteOutcome::Declined => return Err("confirmed delete was declined".to_string()),
    }

    let after = banks.count().await.map_err(|error| error.to_string())?;
    if after + 1 == before {
        Ok(format!("bank {target} removed, {after} remain"))
    } else {
        Err(format!("expected {} banks after delete, found {after}", before - 1))
    }
}

fn instant_gateway() -> SimulatedGateway {
    SimulatedGateway::instant()
}

async fn timed<F>(name: &'static str, check: F) -> SmokeCheck
where
    F: Future<Output = Result<String, String>>,
{
    let started = Instant::now();
    let result = check.await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(message) => SmokeCheck { name, status: SmokeStatus::Pass, elapsed_ms, message },
        Err(message) => SmokeCheck { name, status: SmokeStatus::Fail, elapsed_ms, message },
    }
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((started.elapsed().as_millis() as u64, value)),
        Err(error) => Err((started.elapsed().as_millis() as u64, error)),
    }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
