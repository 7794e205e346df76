use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::derived::PremiumBreakdown;
use crate::documents::DocumentStep;
use crate::domain::request::RequestKind;
use crate::validation::{FieldChecks, FieldError};
use crate::wizard::WizardForm;

const EARLIEST_MANUFACTURING_YEAR: i32 = 1950;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalRequest {
    pub customer_id: String,
    pub customer_name: String,
    pub mobile: String,
    pub email: String,
    pub vehicle_type_code: String,
    pub registration_number: String,
    pub make_model: String,
    pub manufacturing_year: u16,
    pub product_code: String,
    pub insurer_code: String,
    pub sum_insured: Decimal,
    pub policy_start_date: String,
    pub premium: PremiumBreakdown,
}

impl WizardForm for ProposalRequest {
    fn kind(&self) -> RequestKind {
        RequestKind::Proposal
    }

    fn total_steps(&self) -> u8 {
        5
    }

    fn step_title(&self, step: u8) -> &'static str {
        match step {
            1 => "Customer Details",
            2 => "Vehicle Details",
            3 => "Coverage",
            4 => "Premium",
            _ => "Review & Submit",
        }
    }

    fn validate_step(&self, step: u8) -> Vec<FieldError> {
        let mut checks = FieldChecks::new();
        match step {
            1 => {
                checks
                    .required("customer_id", &self.customer_id, "Customer ID is required")
                    .required("customer_name", &self.customer_name, "Customer name is required")
                    .ensure(
                        self.mobile.len() == 10 && self.mobile.chars().all(|c| c.is_ascii_digit()),
                        "mobile",
                        "Mobile number must be 10 digits",
                    )
                    .ensure(
                        self.email.trim().is_empty() || self.email.contains('@'),
                        "email",
                        "Email address is not valid",
                    );
            }
            2 => {
                let year = i32::from(self.manufacturing_year);
                checks
                    .required(
                        "vehicle_type_code",
                        &self.vehicle_type_code,
                        "Vehicle type is required",
                    )
                    .required(
                        "registration_number",
                        &self.registration_number,
                        "Registration number is required",
                    )
                    .required("make_model", &self.make_model, "Make and model are required")
                    .ensure(
                        (EARLIEST_MANUFACTURING_YEAR..=Utc::now().year()).contains(&year),
                        "manufacturing_year",
                        "Manufacturing year is not valid",
                    );
            }
            3 => {
                checks
                    .required("product_code", &self.product_code, "Product is required")
                    .required("insurer_code", &self.insurer_code, "Insurance company is required")
                    .positive(
                        "sum_insured",
                        self.sum_insured,
                        "Sum insured must be greater than zero",
                    )
                    .required(
                        "policy_start_date",
                        &self.policy_start_date,
                        "Policy start date is required",
                    );
            }
            4 => {
                checks
                    .positive(
                        "base_premium",
                        self.premium.base_premium,
                        "Base premium must be greater than zero",
                    )
                    .non_negative(
                        "gst_rate_pct",
                        self.premium.gst_rate_pct,
                        "GST rate cannot be negative",
                    );
            }
            _ => {}
        }
        checks.into_errors()
    }

    fn recompute_derived(&mut self) {
        self.premium.recompute();
    }

    fn subject_id(&self) -> &str {
        &self.registration_number
    }

    fn customer_id(&self) -> &str {
        &self.customer_id
    }

    fn document_step(&self) -> Option<DocumentStep> {
        Some(DocumentStep { step: 2, process_type: "PROPOSAL" })
    }
}
