pub mod audit;
pub mod config;
pub mod derived;
pub mod documents;
pub mod domain;
pub mod errors;
pub mod ids;
pub mod master_data;
pub mod notice;
pub mod submission;
pub mod validation;
pub mod wizard;

pub use audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::approval::InsuranceApprovalRequest;
pub use domain::cancellation::CancellationRequest;
pub use domain::endorsement::EndorsementRequest;
pub use domain::master_data::{
    AuditStamp, Bank, Exam, InsuranceCompany, PolicyProduct, TrainingMaterial, VehicleType,
};
pub use domain::proposal::ProposalRequest;
pub use domain::request::RequestKind;
pub use domain::settlement::SettlementRequest;
pub use domain::verification::Verification64VbRequest;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use ids::{EntityId, IdGenerator, IdStrategy};
pub use master_data::{MasterDataTable, MasterRecord, RecordFilter, RecordRepository};
pub use notice::{Notice, NoticeLevel};
pub use submission::{SimulatedGateway, SubmissionGateway, SubmissionOutcome, SubmissionReceipt};
pub use validation::{FieldError, ValidationErrors};
pub use wizard::{WizardController, WizardForm, WizardOptions};
