//! Reference entities maintained by the master-data tables.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::derived;
use crate::domain::upload::{FileAttachment, UploadError, UploadPolicy};
use crate::ids::EntityId;
use crate::master_data::MasterRecord;
use crate::validation::{FieldChecks, ValidationErrors};

pub const PLACEHOLDER_ACTOR: &str = "Current User";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

impl AuditStamp {
    pub fn created(actor: &str, at: DateTime<Utc>) -> Self {
        Self {
            created_by: actor.to_owned(),
            created_at: at,
            updated_by: actor.to_owned(),
            updated_at: at,
        }
    }

    pub fn touch(&mut self, actor: &str, at: DateTime<Utc>) {
        self.updated_by = actor.to_owned();
        self.updated_at = at;
    }
}

impl Default for AuditStamp {
    fn default() -> Self {
        Self::created(PLACEHOLDER_ACTOR, Utc::now())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankType {
    Public,
    Private,
    Cooperative,
    Foreign,
}

impl BankType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Cooperative => "cooperative",
            Self::Foreign => "foreign",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: EntityId,
    pub bank_name: String,
    pub bank_code: String,
    pub ifsc_prefix: String,
    pub bank_type: BankType,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl MasterRecord for Bank {
    const ENTITY: &'static str = "bank";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn audit(&self) -> &AuditStamp {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditStamp {
        &mut self.audit
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![self.bank_name.as_str(), self.bank_code.as_str(), self.ifsc_prefix.as_str()]
    }

    fn category(&self) -> Option<&str> {
        Some(self.bank_type.as_str())
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .required("bank_name", &self.bank_name, "Bank name is required")
            .required("bank_code", &self.bank_code, "Bank code is required")
            .ensure(
                self.ifsc_prefix.trim().len() == 4,
                "ifsc_prefix",
                "IFSC prefix must be 4 characters",
            );
        checks.finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    General,
    Life,
    Health,
}

impl CompanyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Life => "life",
            Self::Health => "health",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceCompany {
    pub id: EntityId,
    pub company_name: String,
    pub company_code: String,
    pub registration_number: String,
    pub company_type: CompanyType,
    pub contact_email: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl MasterRecord for InsuranceCompany {
    const ENTITY: &'static str = "insurance_company";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn audit(&self) -> &AuditStamp {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditStamp {
        &mut self.audit
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.company_name.as_str(),
            self.company_code.as_str(),
            self.registration_number.as_str(),
        ]
    }

    fn category(&self) -> Option<&str> {
        Some(self.company_type.as_str())
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .required("company_name", &self.company_name, "Company name is required")
            .required("company_code", &self.company_code, "Company code is required")
            .required(
                "registration_number",
                &self.registration_number,
                "Registration number is required",
            )
            .ensure(
                self.contact_email.trim().is_empty() || self.contact_email.contains('@'),
                "contact_email",
                "Contact email is not valid",
            );
        checks.finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    TwoWheeler,
    PrivateCar,
    Commercial,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoWheeler => "two_wheeler",
            Self::PrivateCar => "private_car",
            Self::Commercial => "commercial",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleType {
    pub id: EntityId,
    pub type_name: String,
    pub type_code: String,
    pub category: VehicleCategory,
    pub seating_capacity: u32,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl MasterRecord for VehicleType {
    const ENTITY: &'static str = "vehicle_type";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn audit(&self) -> &AuditStamp {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditStamp {
        &mut self.audit
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![self.type_name.as_str(), self.type_code.as_str()]
    }

    fn category(&self) -> Option<&str> {
        Some(self.category.as_str())
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .required("type_name", &self.type_name, "Vehicle type name is required")
            .required("type_code", &self.type_code, "Vehicle type code is required")
            .ensure(
                self.seating_capacity > 0,
                "seating_capacity",
                "Seating capacity must be at least 1",
            );
        checks.finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineOfBusiness {
    Motor,
    Health,
    Travel,
    Home,
}

impl LineOfBusiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Motor => "motor",
            Self::Health => "health",
            Self::Travel => "travel",
            Self::Home => "home",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyProduct {
    pub id: EntityId,
    pub product_name: String,
    pub product_code: String,
    pub line_of_business: LineOfBusiness,
    pub insurer_code: String,
    pub description: String,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl MasterRecord for PolicyProduct {
    const ENTITY: &'static str = "policy_product";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn audit(&self) -> &AuditStamp {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditStamp {
        &mut self.audit
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![
            self.product_name.as_str(),
            self.product_code.as_str(),
            self.insurer_code.as_str(),
            self.description.as_str(),
        ]
    }

    fn category(&self) -> Option<&str> {
        Some(self.line_of_business.as_str())
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .required("product_name", &self.product_name, "Product name is required")
            .required("product_code", &self.product_code, "Product code is required")
            .required("insurer_code", &self.insurer_code, "Insurance company is required");
        checks.finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamLevel {
    Basic,
    Advanced,
    Certification,
}

impl ExamLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
            Self::Certification => "certification",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: EntityId,
    pub exam_name: String,
    pub exam_code: String,
    pub level: ExamLevel,
    pub total_marks: u32,
    pub minimum_percentage: Decimal,
    /// Derived from `total_marks` and `minimum_percentage`.
    pub minimum_marks: u32,
    pub duration_minutes: u32,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl Exam {
    pub fn recompute_minimum_marks(&mut self) {
        self.minimum_marks = derived::minimum_marks(self.total_marks, self.minimum_percentage);
    }
}

impl MasterRecord for Exam {
    const ENTITY: &'static str = "exam";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn audit(&self) -> &AuditStamp {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditStamp {
        &mut self.audit
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn searchable_text(&self) -> Vec<&str> {
        vec![self.exam_name.as_str(), self.exam_code.as_str()]
    }

    fn category(&self) -> Option<&str> {
        Some(self.level.as_str())
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks
            .required("exam_name", &self.exam_name, "Exam name is required")
            .required("exam_code", &self.exam_code, "Exam code is required")
            .ensure(self.total_marks > 0, "total_marks", "Total marks must be greater than zero")
            .ensure(
                self.minimum_percentage >= Decimal::ZERO
                    && self.minimum_percentage <= Decimal::ONE_HUNDRED,
                "minimum_percentage",
                "Minimum percentage must be between 0 and 100",
            )
            .ensure(
                self.duration_minutes > 0,
                "duration_minutes",
                "Duration must be greater than zero",
            );
        checks.finish()
    }

    fn normalize(&mut self) {
        self.recompute_minimum_marks();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    Video,
    Document,
    Presentation,
}

impl MaterialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Document => "document",
            Self::Presentation => "presentation",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingMaterial {
    pub id: EntityId,
    pub title: String,
    pub material_type: MaterialType,
    pub description: String,
    pub attachment: Option<FileAttachment>,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl TrainingMaterial {
    /// Replaces the attachment with a freshly accepted file.
    pub fn attach(
        &mut self,
        policy: &UploadPolicy,
        file_name: &str,
        mime_type: &str,
        size_bytes: u64,
    ) -> Result<&FileAttachment, UploadError> {
        let attachment = policy.accept(file_name, mime_type, size_bytes)?;
        Ok(self.attachment.insert(attachment))
    }
}

impl MasterRecord for TrainingMaterial {
    const ENTITY: &'static str = "training_material";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn audit(&self) -> &AuditStamp {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditStamp {
        &mut self.audit
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn searchable_text(&self) -> Vec<&str> {
        let mut text = vec![self.title.as_str(), self.description.as_str()];
        if let Some(attachment) = &self.attachment {
            text.push(&attachment.file_name);
        }
        text
    }

    fn category(&self) -> Option<&str> {
        Some(self.material_type.as_str())
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new();
        checks.required("title", &self.title, "Title is required");
        if let Some(attachment) = &self.attachment {
            checks.ensure(
                attachment.reference.starts_with("blob:"),
                "attachment",
                "Attachment must be uploaded before saving",
            );
        }
        checks.finish()
    }
}
