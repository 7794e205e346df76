//! Field-level validation shared by wizard requests and master-data records.
//!
//! Every check produces a [`FieldError`] carrying the field name and a static,
//! user-facing message, so a renderer can show it inline next to the input.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Clone, Debug, Default, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("validation failed: {}", summarize(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// First message reported for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors.iter().find(|error| error.field == field).map(|error| error.message.as_str())
    }

    pub fn fields(&self) -> Vec<String> {
        self.errors.iter().map(|error| error.field.clone()).collect()
    }

    /// `Ok(())` when `errors` is empty.
    pub fn check(errors: Vec<FieldError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Default)]
pub struct FieldChecks {
    errors: Vec<FieldError>,
}

impl FieldChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        self.ensure(!value.trim().is_empty(), field, message)
    }

    pub fn non_negative(&mut self, field: &str, value: Decimal, message: &str) -> &mut Self {
        self.ensure(value >= Decimal::ZERO, field, message)
    }

    pub fn positive(&mut self, field: &str, value: Decimal, message: &str) -> &mut Self {
        self.ensure(value > Decimal::ZERO, field, message)
    }

    pub fn ensure(&mut self, condition: bool, field: &str, message: &str) -> &mut Self {
        if !condition {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = FieldError>) -> &mut Self {
        self.errors.extend(errors);
        self
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        ValidationErrors::check(self.errors)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{FieldChecks, FieldError, ValidationErrors};

    #[test]
    fn checks_collect_every_failure_in_order() {
        let mut checks = FieldChecks::new();
        checks
            .required("policy_number", "  ", "Policy number is required")
            .non_negative("premium_deduction", Decimal::new(-1, 0), "Deduction cannot be negative")
            .positive("total_premium_paid", Decimal::new(500, 0), "Premium must be positive");

        let errors = checks.finish().expect_err("two checks fail");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.fields(), vec!["policy_number", "premium_deduction"]);
        assert_eq!(errors.for_field("policy_number"), Some("Policy number is required"));
        assert_eq!(errors.for_field("total_premium_paid"), None);
    }

    #[test]
    fn empty_error_list_passes() {
        assert!(ValidationErrors::check(Vec::new()).is_ok());
        assert!(FieldChecks::new().finish().is_ok());
    }

    #[test]
    fn display_lists_fields_and_messages() {
        let errors = ValidationErrors::from(vec![
            FieldError::new("claim_id", "Claim ID is required"),
            FieldError::new("date_of_loss", "Date of loss is required"),
        ]);

        assert_eq!(
            errors.to_string(),
            "validation failed: claim_id: Claim ID is required; date_of_loss: Date of loss is required"
        );
    }
}
