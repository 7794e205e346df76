use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::request::RequestKind;
use crate::validation::{FieldChecks, FieldError};
use crate::wizard::WizardForm;

/// How the premium was paid; each mode carries only the fields it needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PaymentInstrument {
    Cheque { cheque_number: String, bank_name: String, instrument_date: String },
    DemandDraft { draft_number: String, bank_name: String, instrument_date: String },
    Online { transaction_id: String },
    Cash { receipt_number: String },
}

impl PaymentInstrument {
    fn check(&self, checks: &mut FieldChecks) {
        match self {
            Self::Cheque { cheque_number, bank_name, instrument_date } => {
                checks
                    .required("cheque_number", cheque_number, "Cheque number is required")
                    .required("bank_name", bank_name, "Bank name is required")
                    .required("instrument_date", instrument_date, "Cheque date is required");
            }
            Self::DemandDraft { draft_number, bank_name, instrument_date } => {
                checks
                    .required("draft_number", draft_number, "Demand draft number is required")
                    .required("bank_name", bank_name, "Bank name is required")
                    .required("instrument_date", instrument_date, "Demand draft date is required");
            }
            Self::Online { transaction_id } => {
                checks.required("transaction_id", transaction_id, "Transaction ID is required");
            }
            Self::Cash { receipt_number } => {
                checks.required(
                    "receipt_number",
                    receipt_number,
                    "Cash receipt number is required",
                );
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealisationStatus {
    Pending,
    Realised,
    Bounced,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Verification64VbRequest {
    pub policy_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub insurer_code: String,
    pub premium_amount: Decimal,
    pub payment_date: String,
    pub instrument: Option<PaymentInstrument>,
    pub realisation_status: Option<RealisationStatus>,
    pub realisation_date: String,
    pub remarks: String,
}

impl WizardForm for Verification64VbRequest {
    fn kind(&self) -> RequestKind {
        RequestKind::Verification64Vb
    }

    fn total_steps(&self) -> u8 {
        4
    }

    fn step_title(&self, step: u8) -> &'static str {
        match step {
            1 => "Policy Details",
            2 => "Payment Details",
            3 => "Realisation",
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
                    .required("insurer_code", &self.insurer_code, "Insurance company is required");
            }
            2 => {
                checks
                    .positive(
                        "premium_amount",
                        self.premium_amount,
                        "Premium amount must be greater than zero",
                    )
                    .required("payment_date", &self.payment_date, "Payment date is required");
                match &self.instrument {
                    Some(instrument) => instrument.check(&mut checks),
                    None => {
                        checks.ensure(false, "instrument", "Payment mode is required");
                    }
                }
            }
            3 => match self.realisation_status {
                None => {
                    checks.ensure(false, "realisation_status", "Realisation status is required");
                }
                Some(RealisationStatus::Realised) => {
                    checks.required(
                        "realisation_date",
                        &self.realisation_date,
                        "Realisation date is required",
                    );
                }
                Some(RealisationStatus::Bounced) => {
                    checks.required(
                        "remarks",
                        &self.remarks,
                        "Remarks are required for a bounced instrument",
                    );
                }
                Some(RealisationStatus::Pending) => {}
            },
            _ => {}
        }
        checks.into_errors()
    }

    fn subject_id(&self) -> &str {
        &self.policy_number
    }

    fn customer_id(&self) -> &str {
        &self.customer_id
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::wizard::WizardForm;

    use super::{PaymentInstrument, RealisationStatus, Verification64VbRequest};

    fn request(instrument: PaymentInstrument) -> Verification64VbRequest {
        Verification64VbRequest {
            policy_number: "POL-MTR-2024-000555".to_owned(),
            customer_id: "CUST-2002".to_owned(),
            customer_name: "Ravi Menon".to_owned(),
            insurer_code: "NIA".to_owned(),
            premium_amount: Decimal::new(14_250, 0),
            payment_date: "2024-06-02".to_owned(),
            instrument: Some(instrument),
            realisation_status: Some(RealisationStatus::Pending),
            ..Verification64VbRequest::default()
        }
    }

    #[test]
    fn cheque_requires_cheque_fields() {
        let request = request(PaymentInstrument::Cheque {
            cheque_number: String::new(),
            bank_name: "State Bank of India".to_owned(),
            instrument_date: String::new(),
        });

        let fields = request.validate_step(2).into_iter().map(|e| e.field).collect::<Vec<_>>();
        assert_eq!(fields, vec!["cheque_number", "instrument_date"]);
    }

    #[test]
    fn online_payment_only_needs_transaction_id() {
        let request = request(PaymentInstrument::Online { transaction_id: "UTR884422".to_owned() });
        assert!(request.validate().is_ok());
    }

    #[test]
    fn bounced_instrument_requires_remarks() {
        let request = Verification64VbRequest {
            realisation_status: Some(RealisationStatus::Bounced),
            ..request(PaymentInstrument::Cash { receipt_number: "RCPT-19".to_owned() })
        };

        let errors = request.validate().expect_err("remarks missing");
        assert_eq!(errors.fields(), vec!["remarks"]);
    }

    #[test]
    fn instrument_deserializes_from_tagged_json() {
        let instrument: PaymentInstrument =
            serde_json::from_str(r#"{"mode":"online","transaction_id":"UTR1"}"#)
                .expect("tagged instrument");
        assert_eq!(instrument, PaymentInstrument::Online { transaction_id: "UTR1".to_owned() });
    }
}
