use thiserror::Error;

use crate::config::ConfigError;
use crate::master_data::{RepositoryError, TableError};
use crate::submission::SubmissionError;
use crate::validation::ValidationErrors;
use crate::wizard::{WizardError, WizardTransitionError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    WizardTransition(#[from] WizardTransitionError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check the highlighted fields and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The request could not be submitted right now. Please try again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<SubmissionError> for ApplicationError {
    fn from(value: SubmissionError) -> Self {
        Self::Integration(value.to_string())
    }
}

impl From<WizardError> for ApplicationError {
    fn from(value: WizardError) -> Self {
        match value {
            WizardError::Transition(error) => Self::Domain(DomainError::WizardTransition(error)),
            WizardError::Submission(error) => Self::from(error),
            WizardError::Locked => Self::Domain(DomainError::InvariantViolation(
                "request is locked after confirmation".to_owned(),
            )),
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        Self::Persistence(value.to_string())
    }
}

impl From<TableError> for ApplicationError {
    fn from(value: TableError) -> Self {
        match value {
            TableError::Validation(errors) => Self::Domain(DomainError::Validation(errors)),
            TableError::Repository(error) => Self::from(error),
            TableError::NoOpenForm => Self::Domain(DomainError::InvariantViolation(
                "no add or edit form is open".to_owned(),
            )),
        }
    }
}

impl From<ConfigError> for ApplicationError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(DomainError::WizardTransition(_))
            | ApplicationError::Domain(DomainError::Validation(_))
            | ApplicationError::Domain(DomainError::InvariantViolation(_)) => Self::BadRequest {
                message: "domain validation failed".to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
