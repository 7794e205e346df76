use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::request::RequestKind;
use crate::validation::{FieldChecks, FieldError};
use crate::wizard::WizardForm;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

/// Underwriter decision; fields that only make sense for one outcome live on that variant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApprovalDecision {
    #[default]
    Pending,
    Approved {
        approved_premium: Decimal,
        conditions: String,
    },
    Rejected {
        rejection_reason: String,
    },
    Referred {
        referred_to: String,
        query: String,
    },
}

impl ApprovalDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved { .. } => "approved",
            Self::Rejected { .. } => "rejected",
            Self::Referred { .. } => "referred",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsuranceApprovalRequest {
    pub approval_request_id: String,
    pub proposal_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub product_code: String,
    pub sum_insured: Decimal,
    pub quoted_premium: Decimal,
    pub risk_category: Option<RiskCategory>,
    pub decision: ApprovalDecision,
    pub approver_name: String,
    pub decision_date: String,
}

impl WizardForm for InsuranceApprovalRequest {
    fn kind(&self) -> RequestKind {
        RequestKind::InsuranceApproval
    }

    fn total_steps(&self) -> u8 {
        4
    }

    fn step_title(&self, step: u8) -> &'static str {
        match step {
            1 => "Request Details",
            2 => "Risk Assessment",
            3 => "Decision",
            _ => "Review & Submit",
        }
    }

    fn validate_step(&self, step: u8) -> Vec<FieldError> {
        let mut checks = FieldChecks::new();
        match step {
            1 => {
                checks
                    .required(
                        "approval_request_id",
                        &self.approval_request_id,
                        "Approval request ID is required",
                    )
                    .required(
                        "proposal_number",
                        &self.proposal_number,
                        "Proposal number is required",
                    )
                    .required("customer_id", &self.customer_id, "Customer ID is required")
                    .required("customer_name", &self.customer_name, "Customer name is required")
                    .required("product_code", &self.product_code, "Product is required");
            }
            2 => {
                checks
                    .positive(
                        "sum_insured",
                        self.sum_insured,
                        "Sum insured must be greater than zero",
                    )
                    .positive(
                        "quoted_premium",
                        self.quoted_premium,
                        "Quoted premium must be greater than zero",
                    )
                    .ensure(
                        self.risk_category.is_some(),
                        "risk_category",
                        "Risk category is required",
                    );
            }
            3 => {
                match &self.decision {
                    ApprovalDecision::Pending => {
                        checks.ensure(false, "decision", "Approval decision is required");
                    }
                    ApprovalDecision::Approved { approved_premium, .. } => {
                        checks.positive(
                            "approved_premium",
                            *approved_premium,
                            "Approved premium must be greater than zero",
                        );
                    }
                    ApprovalDecision::Rejected { rejection_reason } => {
                        checks.required(
                            "rejection_reason",
                            rejection_reason,
                            "Rejection reason is required",
                        );
                    }
                    ApprovalDecision::Referred { referred_to, query } => {
                        checks
                            .required("referred_to", referred_to, "Referral recipient is required")
                            .required("query", query, "Referral query is required");
                    }
                }
                checks
                    .required("approver_name", &self.approver_name, "Approver name is required")
                    .required("decision_date", &self.decision_date, "Decision date is required");
            }
            _ => {}
        }
        checks.into_errors()
    }

    fn subject_id(&self) -> &str {
        &self.approval_request_id
    }

    fn customer_id(&self) -> &str {
        &self.customer_id
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::wizard::WizardForm;

    use super::{ApprovalDecision, InsuranceApprovalRequest, RiskCategory};

    fn request(decision: ApprovalDecision) -> InsuranceApprovalRequest {
        InsuranceApprovalRequest {
            approval_request_id: "APR-REQ-0042".to_owned(),
            proposal_number: "PRP-2024-0042".to_owned(),
            customer_id: "CUST-3003".to_owned(),
            customer_name: "Meera Iyer".to_owned(),
            product_code: "MOTOR-PC".to_owned(),
            sum_insured: Decimal::new(850_000, 0),
            quoted_premium: Decimal::new(21_400, 0),
            risk_category: Some(RiskCategory::Medium),
            decision,
            approver_name: "K. Rao".to_owned(),
            decision_date: "2024-07-11".to_owned(),
        }
    }

    #[test]
    fn pending_decision_blocks_submission() {
        let errors = request(ApprovalDecision::Pending).validate().expect_err("pending");
        assert_eq!(errors.fields(), vec!["decision"]);
    }

    #[test]
    fn each_decision_checks_only_its_own_fields() {
        let approved = request(ApprovalDecision::Approved {
            approved_premium: Decimal::new(22_000, 0),
            conditions: String::new(),
        });
        assert!(approved.validate().is_ok());

        let rejected =
            request(ApprovalDecision::Rejected { rejection_reason: "  ".to_owned() });
        assert_eq!(rejected.validate_step(3)[0].field, "rejection_reason");

        let referred = request(ApprovalDecision::Referred {
            referred_to: "Chief Underwriter".to_owned(),
            query: String::new(),
        });
        assert_eq!(referred.validate_step(3)[0].field, "query");
    }

    #[test]
    fn decision_serializes_with_status_tag() {
        let value = serde_json::to_value(ApprovalDecision::Rejected {
            rejection_reason: "Prior claims history".to_owned(),
        })
        .expect("serialize decision");
        assert_eq!(value["status"], "rejected");
        assert_eq!(value["rejection_reason"], "Prior claims history");
    }
}
