use serde::{Deserialize, Serialize};

use crate::derived::PremiumBreakdown;
use crate::domain::request::RequestKind;
use crate::validation::{FieldChecks, FieldError};
use crate::wizard::WizardForm;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndorsedField {
    Address,
    ContactDetails,
    Nominee,
    Hypothecation,
    RegistrationNumber,
    SumInsured,
    AddOnCover,
}

impl EndorsedField {
    /// Changes to cover always move the premium.
    pub fn affects_premium(&self) -> bool {
        matches!(self, Self::SumInsured | Self::AddOnCover)
    }
}

/// Nil endorsements change policy details only; non-nil ones carry a premium adjustment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EndorsementChange {
    #[default]
    Nil,
    NonNil {
        premium: PremiumBreakdown,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndorsementStage {
    Policy,
    Change,
    Premium,
    Effective,
    Review,
}

const NIL_STAGES: [EndorsementStage; 4] = [
    EndorsementStage::Policy,
    EndorsementStage::Change,
    EndorsementStage::Effective,
    EndorsementStage::Review,
];

const NON_NIL_STAGES: [EndorsementStage; 5] = [
    EndorsementStage::Policy,
    EndorsementStage::Change,
    EndorsementStage::Premium,
    EndorsementStage::Effective,
    EndorsementStage::Review,
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndorsementRequest {
    pub policy_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub endorsed_field: Option<EndorsedField>,
    pub current_value: String,
    pub new_value: String,
    pub change: EndorsementChange,
    pub effective_date: String,
    pub remarks: String,
}

impl EndorsementRequest {
    pub fn stages(&self) -> &'static [EndorsementStage] {
        match self.change {
            EndorsementChange::Nil => &NIL_STAGES,
            EndorsementChange::NonNil { .. } => &NON_NIL_STAGES,
        }
    }

    pub fn stage(&self, step: u8) -> Option<EndorsementStage> {
        let index = usize::from(step).checked_sub(1)?;
        self.stages().get(index).copied()
    }
}

impl WizardForm for EndorsementRequest {
    fn kind(&self) -> RequestKind {
        RequestKind::Endorsement
    }

    fn total_steps(&self) -> u8 {
        self.stages().len() as u8
    }

    fn step_title(&self, step: u8) -> &'static str {
        match self.stage(step) {
            Some(EndorsementStage::Policy) => "Policy Details",
            Some(EndorsementStage::Change) => "Endorsement Details",
            Some(EndorsementStage::Premium) => "Premium Adjustment",
            Some(EndorsementStage::Effective) => "Effective Date",
            Some(EndorsementStage::Review) | None => "Review & Submit",
        }
    }

    fn validate_step(&self, step: u8) -> Vec<FieldError> {
        let mut checks = FieldChecks::new();
        match self.stage(step) {
            Some(EndorsementStage::Policy) => {
                checks
                    .required("policy_number", &self.policy_number, "Policy number is required")
                    .required("customer_id", &self.customer_id, "Customer ID is required")
                    .required("customer_name", &self.customer_name, "Customer name is required");
            }
            Some(EndorsementStage::Change) => {
                checks
                    .ensure(
                        self.endorsed_field.is_some(),
                        "endorsed_field",
                        "Field to endorse is required",
                    )
                    .required("new_value", &self.new_value, "New value is required")
                    .ensure(
                        self.new_value.trim() != self.current_value.trim(),
                        "new_value",
                        "New value must differ from the current value",
                    );
                if let Some(field) = self.endorsed_field {
                    checks.ensure(
                        !field.affects_premium()
                            || matches!(self.change, EndorsementChange::NonNil { .. }),
                        "change",
                        "This change requires a premium adjustment",
                    );
                }
            }
            Some(EndorsementStage::Premium) => {
                if let EndorsementChange::NonNil { premium } = &self.change {
                    checks
                        .positive(
                            "base_premium",
                            premium.base_premium,
                            "Additional premium must be greater than zero",
                        )
                        .non_negative(
                            "gst_rate_pct",
                            premium.gst_rate_pct,
                            "GST rate cannot be negative",
                        );
                }
            }
            Some(EndorsementStage::Effective) => {
                checks.required(
                    "effective_date",
                    &self.effective_date,
                    "Effective date is required",
                );
            }
            Some(EndorsementStage::Review) | None => {}
        }
        checks.into_errors()
    }

    fn recompute_derived(&mut self) {
        if let EndorsementChange::NonNil { premium } = &mut self.change {
            premium.recompute();
        }
    }

    fn subject_id(&self) -> &str {
        &self.policy_number
    }

    fn customer_id(&self) -> &str {
        &self.customer_id
    }
}
