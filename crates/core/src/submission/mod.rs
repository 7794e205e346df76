//! Submission gateway seam.
//!
//! Wizards hand a validated request to a [`SubmissionGateway`]. The simulated
//! gateway stands in for the insurer systems; a network client can replace it
//! behind the same trait.

pub mod cancel;
pub mod simulated;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::domain::request::RequestKind;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use simulated::SimulatedGateway;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMode {
    Direct,
    Manual,
}

impl IntegrationMode {
    pub fn from_flag(integration_enabled: bool) -> Self {
        if integration_enabled {
            Self::Direct
        } else {
            Self::Manual
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionEnvelope {
    pub kind: RequestKind,
    pub subject_id: String,
    pub correlation_id: String,
    pub mode: IntegrationMode,
    pub payload: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Submitted,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub kind: RequestKind,
    pub request_id: String,
    pub status: SubmissionStatus,
    pub reference_number: String,
    pub message: String,
    pub next_steps: Vec<String>,
}

impl SubmissionReceipt {
    /// Wire shape of the integration response, keyed `<idPrefix>Id`.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert(format!("{}Id", self.kind.id_prefix()), Value::String(self.request_id.clone()));
        body.insert("status".to_owned(), Value::String(self.status.as_str().to_owned()));
        body.insert("referenceNumber".to_owned(), Value::String(self.reference_number.clone()));
        body.insert("message".to_owned(), Value::String(self.message.clone()));
        body.insert(
            "nextSteps".to_owned(),
            Value::Array(self.next_steps.iter().cloned().map(Value::String).collect()),
        );
        Value::Object(body)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Integrated { receipt: SubmissionReceipt },
    Manual { message: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("submission cancelled before completion")]
    Cancelled,
    #[error("submission timed out after {after_ms} ms")]
    TimedOut { after_ms: u64 },
    #[error("request could not be serialized: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(
        &self,
        envelope: SubmissionEnvelope,
    ) -> Result<SubmissionOutcome, SubmissionError>;
}

/// Runs `gateway.submit` until it finishes, `signal` fires, or `timeout` elapses.
pub async fn submit_guarded<G>(
    gateway: &G,
    envelope: SubmissionEnvelope,
    signal: &CancelSignal,
    timeout: Option<Duration>,
) -> Result<SubmissionOutcome, SubmissionError>
where
    G: SubmissionGateway + ?Sized,
{
    let call = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, gateway.submit(envelope))
                .await
                .map_err(|_| SubmissionError::TimedOut { after_ms: limit.as_millis() as u64 })?,
            None => gateway.submit(envelope).await,
        }
    };

    tokio::select! {
        biased;
        _ = signal.cancelled() => Err(SubmissionError::Cancelled),
        result = call => result,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use crate::domain::request::RequestKind;

    use super::{
        cancel_pair, submit_guarded, CancelSignal, IntegrationMode, SimulatedGateway,
        SubmissionEnvelope, SubmissionError, SubmissionOutcome, SubmissionReceipt,
        SubmissionStatus,
    };

    fn envelope(mode: IntegrationMode) -> SubmissionEnvelope {
        SubmissionEnvelope {
            kind: RequestKind::Cancellation,
            subject_id: "POL-MTR-2024-000123".to_owned(),
            correlation_id: "req-1".to_owned(),
            mode,
            payload: json!({ "policy_number": "POL-MTR-2024-000123" }),
        }
    }

    #[test]
    fn receipt_json_uses_prefixed_id_key() {
        let receipt = SubmissionReceipt {
            kind: RequestKind::InsuranceApproval,
            request_id: "APR-1730000000000".to_owned(),
            status: SubmissionStatus::Submitted,
            reference_number: "REF-1730000000000".to_owned(),
            message: "submitted".to_owned(),
            next_steps: vec!["wait".to_owned()],
        };

        let body = receipt.to_json();
        assert_eq!(body["approvalId"], "APR-1730000000000");
        assert_eq!(body["status"], "SUBMITTED");
        assert_eq!(body["referenceNumber"], "REF-1730000000000");
        assert_eq!(body["nextSteps"][0], "wait");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_signal_aborts_pending_submission() {
        let gateway = SimulatedGateway::new(Duration::from_secs(3), Duration::from_secs(2));
        let (handle, signal) = cancel_pair();

        let pending = submit_guarded(&gateway, envelope(IntegrationMode::Direct), &signal, None);
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            handle.cancel();
        };

        let (result, ()) = tokio::join!(pending, cancel);
        assert_eq!(result, Err(SubmissionError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels_the_submission() {
        let gateway = SimulatedGateway::new(Duration::from_secs(3), Duration::from_secs(2));
        let (handle, signal) = cancel_pair();
        drop(handle);

        let result =
            submit_guarded(&gateway, envelope(IntegrationMode::Manual), &signal, None).await;
        assert_eq!(result, Err(SubmissionError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_maps_to_timed_out() {
        let gateway = SimulatedGateway::new(Duration::from_secs(3), Duration::from_secs(2));

        let result = submit_guarded(
            &gateway,
            envelope(IntegrationMode::Direct),
            &CancelSignal::never(),
            Some(Duration::from_millis(1_000)),
        )
        .await;
        assert_eq!(result, Err(SubmissionError::TimedOut { after_ms: 1_000 }));
    }

    #[tokio::test(start_paused = true)]
    async fn guarded_submission_passes_through_outcome() {
        let gateway = SimulatedGateway::new(Duration::from_secs(3), Duration::from_secs(2));

        let result = submit_guarded(
            &gateway,
            envelope(IntegrationMode::Manual),
            &CancelSignal::never(),
            Some(Duration::from_secs(10)),
        )
        .await
        .expect("manual path succeeds");
        assert!(matches!(result, SubmissionOutcome::Manual { .. }));
    }
}
