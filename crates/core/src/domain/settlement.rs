use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::derived;
use crate::documents::DocumentStep;
use crate::domain::request::RequestKind;
use crate::validation::{FieldChecks, FieldError};
use crate::wizard::WizardForm;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementType {
    Cashless,
    Reimbursement,
    TotalLoss,
    PartialLoss,
}

const IFSC_LENGTH: usize = 11;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementRequest {
    pub claim_id: String,
    pub policy_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub date_of_loss: String,
    pub settlement_type: Option<SettlementType>,
    pub survey_report_number: String,
    pub claimed_amount: Decimal,
    pub approved_amount: Decimal,
    pub deductible: Decimal,
    pub salvage_value: Decimal,
    pub payable_amount: Decimal,
    pub payee_name: String,
    pub account_number: String,
    pub ifsc_code: String,
}

impl WizardForm for SettlementRequest {
    fn kind(&self) -> RequestKind {
        RequestKind::Settlement
    }

    fn total_steps(&self) -> u8 {
        4
    }

    fn step_title(&self, step: u8) -> &'static str {
        match step {
            1 => "Claim Details",
            2 => "Assessment",
            3 => "Settlement Amount",
            _ => "Review & Submit",
        }
    }

    fn validate_step(&self, step: u8) -> Vec<FieldError> {
        let mut checks = FieldChecks::new();
        match step {
            1 => {
                checks
                    .required("claim_id", &self.claim_id, "Claim ID is required")
                    .required("policy_number", &self.policy_number, "Policy number is required")
                    .required("customer_id", &self.customer_id, "Customer ID is required")
                    .required("customer_name", &self.customer_name, "Customer name is required")
                    .required("date_of_loss", &self.date_of_loss, "Date of loss is required");
            }
            2 => {
                checks
                    .ensure(
                        self.settlement_type.is_some(),
                        "settlement_type",
                        "Settlement type is required",
                    )
                    .required(
                        "survey_report_number",
                        &self.survey_report_number,
                        "Survey report number is required",
                    )
                    .positive(
                        "claimed_amount",
                        self.claimed_amount,
                        "Claimed amount must be greater than zero",
                    );
            }
            3 => {
                checks
                    .non_negative(
                        "approved_amount",
                        self.approved_amount,
                        "Approved amount cannot be negative",
                    )
                    .ensure(
                        self.approved_amount <= self.claimed_amount,
                        "approved_amount",
                        "Approved amount cannot exceed the claimed amount",
                    )
                    .non_negative("deductible", self.deductible, "Deductible cannot be negative")
                    .non_negative(
                        "salvage_value",
                        self.salvage_value,
                        "Salvage value cannot be negative",
                    )
                    .required("payee_name", &self.payee_name, "Payee name is required")
                    .required("account_number", &self.account_number, "Account number is required")
                    .ensure(
                        self.ifsc_code.trim().len() == IFSC_LENGTH,
                        "ifsc_code",
                        "IFSC code must be 11 characters",
                    );
            }
            _ => {}
        }
        checks.into_errors()
    }

    fn recompute_derived(&mut self) {
        self.payable_amount =
            derived::settlement_payable(self.approved_amount, self.deductible, self.salvage_value);
    }

    fn subject_id(&self) -> &str {
        &self.claim_id
    }

    fn customer_id(&self) -> &str {
        &self.customer_id
    }

    fn document_step(&self) -> Option<DocumentStep> {
        Some(DocumentStep { step: 2, process_type: "CLAIM_SETTLEMENT" })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::wizard::WizardForm;

    use super::{SettlementRequest, SettlementType};

    pub(crate) fn complete() -> SettlementRequest {
        let mut request = SettlementRequest {
            claim_id: "CLM-2024-000981".to_owned(),
            policy_number: "POL-MTR-2024-000123".to_owned(),
            customer_id: "CUST-1001".to_owned(),
            customer_name: "Asha Verma".to_owned(),
            date_of_loss: "2024-08-02".to_owned(),
            settlement_type: Some(SettlementType::Reimbursement),
            survey_report_number: "SR-5531".to_owned(),
            claimed_amount: Decimal::new(120_000, 0),
            approved_amount: Decimal::new(100_000, 0),
            deductible: Decimal::new(5_000, 0),
            salvage_value: Decimal::new(10_000, 0),
            payee_name: "Asha Verma".to_owned(),
            account_number: "001122334455".to_owned(),
            ifsc_code: "SBIN0001234".to_owned(),
            ..SettlementRequest::default()
        };
        request.recompute_derived();
        request
    }

    #[test]
    fn payable_subtracts_deductible_and_salvage() {
        let request = complete();
        assert_eq!(request.payable_amount, Decimal::new(85_000, 0));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn payable_never_goes_negative() {
        let mut request = SettlementRequest { deductible: Decimal::new(200_000, 0), ..complete() };
        request.recompute_derived();
        assert_eq!(request.payable_amount, Decimal::ZERO);
    }

    #[test]
    fn approved_above_claimed_and_short_ifsc_are_reported() {
        let request = SettlementRequest {
            approved_amount: Decimal::new(150_000, 0),
            ifsc_code: "SBIN01".to_owned(),
            ..complete()
        };

        let fields = request.validate_step(3).into_iter().map(|e| e.field).collect::<Vec<_>>();
        assert_eq!(fields, vec!["approved_amount", "ifsc_code"]);
    }
}
