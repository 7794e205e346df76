use serde::Serialize;

use crate::domain::master_data::AuditStamp;
use crate::ids::EntityId;
use crate::validation::ValidationErrors;

pub const STATUS_FACET: &str = "status";
pub const TYPE_FACET: &str = "type";

/// A flat reference-data row maintained through a [`super::MasterDataTable`].
pub trait MasterRecord: Clone + Serialize + Send + Sync + 'static {
    /// Singular entity name used in logs, audit events and CLI output.
    const ENTITY: &'static str;

    fn id(&self) -> &EntityId;

    fn assign_id(&mut self, id: EntityId);

    fn audit(&self) -> &AuditStamp;

    fn audit_mut(&mut self) -> &mut AuditStamp;

    fn is_active(&self) -> bool;

    /// Text fields the free-text search matches against.
    fn searchable_text(&self) -> Vec<&str>;

    /// Value for the `type` facet, for entities that have one.
    fn category(&self) -> Option<&str> {
        None
    }

    fn facet(&self, dimension: &str) -> Option<&str> {
        match dimension {
            STATUS_FACET => Some(if self.is_active() { "active" } else { "inactive" }),
            TYPE_FACET => self.category(),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Recomputes derived fields before the record is stored.
    fn normalize(&mut self) {}
}
