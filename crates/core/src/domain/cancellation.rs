use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::derived;
use crate::documents::DocumentStep;
use crate::domain::request::RequestKind;
use crate::validation::{FieldChecks, FieldError};
use crate::wizard::WizardForm;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationReason {
    VehicleSold,
    DuplicatePolicy,
    AlternatePolicy,
    NonPaymentOfPremium,
    CustomerRequest,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundMode {
    SourceAccount,
    BankTransfer,
    Cheque,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CancellationRequest {
    pub policy_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub policy_start_date: String,
    pub policy_end_date: String,
    pub cancellation_reason: Option<CancellationReason>,
    pub reason_details: String,
    pub cancellation_date: String,
    pub effective_date: String,
    pub total_premium_paid: Decimal,
    pub premium_deduction: Decimal,
    pub refund_amount: Decimal,
    pub refund_mode: Option<RefundMode>,
    pub remarks: String,
}

impl WizardForm for CancellationRequest {
    fn kind(&self) -> RequestKind {
        RequestKind::Cancellation
    }

    fn total_steps(&self) -> u8 {
        4
    }

    fn step_title(&self, step: u8) -> &'static str {
        match step {
            1 => "Policy Details",
            2 => "Cancellation Details",
            3 => "Refund Calculation",
            _ => "Review & Submit",
        }
    }

    fn validate_step(&self, step: u8) -> Vec<FieldError> {
        let mut checks = FieldChecks::new();
        match step {
            1 => {
                checks
                    .required("policy_number", &self.policy_number, "Policy number is required")
                    .required("customer_id", &self.customer_id, "Customer ID is required")
                    .required("customer_name", &self.customer_name, "Customer name is required")
                    .required(
                        "policy_start_date",
                        &self.policy_start_date,
                        "Policy start date is required",
                    )
                    .required(
                        "policy_end_date",
                        &self.policy_end_date,
                        "Policy end date is required",
                    );
            }
            2 => {
                checks
                    .ensure(
                        self.cancellation_reason.is_some(),
                        "cancellation_reason",
                        "Cancellation reason is required",
                    )
                    .required(
                        "cancellation_date",
                        &self.cancellation_date,
                        "Cancellation date is required",
                    )
                    .required("effective_date", &self.effective_date, "Effective date is required");
                if self.cancellation_reason == Some(CancellationReason::Other) {
                    checks.required(
                        "reason_details",
                        &self.reason_details,
                        "Please describe the cancellation reason",
                    );
                }
            }
            3 => {
                checks
                    .positive(
                        "total_premium_paid",
                        self.total_premium_paid,
                        "Total premium paid must be greater than zero",
                    )
                    .non_negative(
                        "premium_deduction",
                        self.premium_deduction,
                        "Premium deduction cannot be negative",
                    )
                    .ensure(
                        self.premium_deduction <= self.total_premium_paid,
                        "premium_deduction",
                        "Premium deduction cannot exceed the premium paid",
                    )
                    .ensure(self.refund_mode.is_some(), "refund_mode", "Refund mode is required");
            }
            _ => {}
        }
        checks.into_errors()
    }

    fn recompute_derived(&mut self) {
        self.refund_amount =
            derived::refund_amount(self.total_premium_paid, self.premium_deduction);
    }

    fn subject_id(&self) -> &str {
        &self.policy_number
    }

    fn customer_id(&self) -> &str {
        &self.customer_id
    }

    fn document_step(&self) -> Option<DocumentStep> {
        Some(DocumentStep { step: 2, process_type: "CANCELLATION" })
    }
}
