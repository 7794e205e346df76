use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::config::GatewayConfig;

use super::{
    IntegrationMode, SubmissionEnvelope, SubmissionError, SubmissionGateway, SubmissionOutcome,
    SubmissionReceipt, SubmissionStatus,
};

/// Fixed-latency gateway standing in for insurer systems.
#[derive(Clone, Debug)]
pub struct SimulatedGateway {
    integration_latency: Duration,
    manual_latency: Duration,
    failure: Option<String>,
}

impl SimulatedGateway {
    pub fn new(integration_latency: Duration, manual_latency: Duration) -> Self {
        Self { integration_latency, manual_latency, failure: None }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            Duration::from_millis(config.integration_latency_ms),
            Duration::from_millis(config.manual_latency_ms),
        )
    }

    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Every submission waits its latency and then fails with `reason`.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}

#[async_trait]
impl SubmissionGateway for SimulatedGateway {
    async fn submit(
        &self,
        envelope: SubmissionEnvelope,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let latency = match envelope.mode {
            IntegrationMode::Direct => self.integration_latency,
            IntegrationMode::Manual => self.manual_latency,
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(reason) = &self.failure {
            return Err(SubmissionError::Rejected(reason.clone()));
        }

        let kind = envelope.kind;
        match envelope.mode {
            IntegrationMode::Direct => {
                let stamp = Utc::now().timestamp_millis();
                let receipt = SubmissionReceipt {
                    kind,
                    request_id: format!("{}-{stamp}", kind.reference_code()),
                    status: SubmissionStatus::Submitted,
                    reference_number: format!("REF-{stamp}"),
                    message: format!(
                        "{} request for {} submitted to the insurer system",
                        capitalize(kind.label()),
                        envelope.subject_id
                    ),
                    next_steps: kind.next_steps().iter().map(|step| (*step).to_owned()).collect(),
                };
                info!(
                    event_name = "submission.gateway.integrated",
                    correlation_id = %envelope.correlation_id,
                    request_kind = kind.as_str(),
                    reference_number = %receipt.reference_number,
                    "request submitted through direct integration"
                );
                Ok(SubmissionOutcome::Integrated { receipt })
            }
            IntegrationMode::Manual => {
                info!(
                    event_name = "submission.gateway.manual",
                    correlation_id = %envelope.correlation_id,
                    request_kind = kind.as_str(),
                    "request queued for manual processing"
                );
                Ok(SubmissionOutcome::Manual {
                    message: format!(
                        "{} request for {} submitted for manual processing",
                        capitalize(kind.label()),
                        envelope.subject_id
                    ),
                })
            }
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::Instant;

    use crate::domain::request::RequestKind;
    use crate::submission::{
        IntegrationMode, SimulatedGateway, SubmissionEnvelope, SubmissionError,
        SubmissionGateway, SubmissionOutcome, SubmissionStatus,
    };

    fn envelope(kind: RequestKind, mode: IntegrationMode) -> SubmissionEnvelope {
        SubmissionEnvelope {
            kind,
            subject_id: "CLM-2024-000981".to_owned(),
            correlation_id: "req-9".to_owned(),
            mode,
            payload: json!({}),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn direct_path_waits_integration_latency_and_returns_receipt() {
        let gateway = SimulatedGateway::default();
        let started = Instant::now();

        let outcome = gateway
            .submit(envelope(RequestKind::Settlement, IntegrationMode::Direct))
            .await
            .expect("direct submission succeeds");

        assert!(started.elapsed() >= Duration::from_millis(3_000));
        let SubmissionOutcome::Integrated { receipt } = outcome else {
            panic!("expected integrated outcome");
        };
        assert_eq!(receipt.status, SubmissionStatus::Submitted);
        assert!(receipt.reference_number.starts_with("REF-"));
        assert!(receipt.request_id.starts_with("STL-"));
        assert!(!receipt.next_steps.is_empty());
        assert!(receipt.message.starts_with("Settlement request for CLM-2024-000981"));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_path_waits_shorter_latency_without_receipt() {
        let gateway = SimulatedGateway::default();
        let started = Instant::now();

        let outcome = gateway
            .submit(envelope(RequestKind::Cancellation, IntegrationMode::Manual))
            .await
            .expect("manual submission succeeds");

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(2_000));
        assert!(elapsed < Duration::from_millis(3_000));
        assert!(matches!(outcome, SubmissionOutcome::Manual { .. }));
    }

    #[tokio::test]
    async fn failing_gateway_rejects() {
        let gateway = SimulatedGateway::instant().failing("insurer endpoint unavailable");

        let error = gateway
            .submit(envelope(RequestKind::Proposal, IntegrationMode::Direct))
            .await
            .expect_err("configured to fail");
        assert_eq!(error, SubmissionError::Rejected("insurer endpoint unavailable".to_owned()));
    }
}
