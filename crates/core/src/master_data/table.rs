use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::master_data::AuditStamp;
use crate::ids::EntityId;
use crate::notice::Notice;
use crate::validation::ValidationErrors;

use super::filter::{apply_filter, FacetSelection, RecordFilter};
use super::record::MasterRecord;
use super::repository::{RecordRepository, RepositoryError};

/// Synchronous yes/no confirmation shown before destructive actions.
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ModalState<R> {
    #[default]
    Closed,
    Adding(R),
    Editing(R),
}

impl<R> ModalState<R> {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn draft(&self) -> Option<&R> {
        match self {
            Self::Closed => None,
            Self::Adding(draft) | Self::Editing(draft) => Some(draft),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome<R> {
    Deleted(R),
    Declined,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("no add or edit form is open")]
    NoOpenForm,
}

/// List, filter and CRUD over one master-data repository.
pub struct MasterDataTable<R: MasterRecord> {
    repository: Arc<dyn RecordRepository<R>>,
    filter: RecordFilter,
    modal: ModalState<R>,
    actor: String,
    correlation_id: String,
    audit: Option<Arc<dyn AuditSink>>,
    notices: Vec<Notice>,
}

impl<R: MasterRecord> MasterDataTable<R> {
    pub fn new(repository: Arc<dyn RecordRepository<R>>, actor: impl Into<String>) -> Self {
        Self {
            repository,
            filter: RecordFilter::default(),
            modal: ModalState::Closed,
            actor: actor.into(),
            correlation_id: uuid::Uuid::new_v4().to_string(),
            audit: None,
            notices: Vec::new(),
        }
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filter.search = term.into();
    }

    pub fn set_facet(&mut self, dimension: impl Into<String>, selection: FacetSelection) {
        self.filter.facets.insert(dimension.into(), selection);
    }

    pub fn clear_filters(&mut self) {
        self.filter = RecordFilter::default();
    }

    pub fn modal(&self) -> &ModalState<R> {
        &self.modal
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Rows visible under the current search and facet filters.
    pub async fn rows(&self) -> Result<Vec<R>, TableError> {
        let records = self.repository.list().await?;
        Ok(apply_filter(&records, &self.filter))
    }

    pub async fn total(&self) -> Result<usize, TableError> {
        Ok(self.repository.count().await?)
    }

    pub fn open_add(&mut self, template: R) {
        self.modal = ModalState::Adding(template);
    }

    pub async fn open_edit(&mut self, id: &EntityId) -> Result<(), TableError> {
        let record = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound { entity: R::ENTITY, id: id.clone() })?;
        self.modal = ModalState::Editing(record);
        Ok(())
    }

    pub fn draft_mut(&mut self) -> Option<&mut R> {
        match &mut self.modal {
            ModalState::Closed => None,
            ModalState::Adding(draft) | ModalState::Editing(draft) => Some(draft),
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = ModalState::Closed;
    }

    /// Saves the open add/edit form. The form stays open when validation fails.
    pub async fn save_modal(&mut self) -> Result<R, TableError> {
        let saved = match self.modal.clone() {
            ModalState::Closed => return Err(TableError::NoOpenForm),
            ModalState::Adding(draft) => self.create(draft).await?,
            ModalState::Editing(draft) => self.update(draft).await?,
        };
        self.modal = ModalState::Closed;
        Ok(saved)
    }

    pub async fn create(&mut self, mut record: R) -> Result<R, TableError> {
        record.normalize();
        record.validate()?;
        *record.audit_mut() = AuditStamp::created(&self.actor, Utc::now());

        let created = self.repository.create(record).await?;
        info!(
            event_name = "master_data.record_created",
            correlation_id = %self.correlation_id,
            entity = R::ENTITY,
            record_id = %created.id(),
            "master-data record created"
        );
        self.record_audit("master_data.record_created", created.id());
        self.notices
            .push(Notice::success(format!("{} added successfully", entity_label::<R>())));
        Ok(created)
    }

    pub async fn update(&mut self, mut record: R) -> Result<R, TableError> {
        record.normalize();
        record.validate()?;
        record.audit_mut().touch(&self.actor, Utc::now());

        let updated = self.repository.update(record).await?;
        info!(
            event_name = "master_data.record_updated",
            correlation_id = %self.correlation_id,
            entity = R::ENTITY,
            record_id = %updated.id(),
            "master-data record updated"
        );
        self.record_audit("master_data.record_updated", updated.id());
        self.notices
            .push(Notice::success(format!("{} updated successfully", entity_label::<R>())));
        Ok(updated)
    }

    /// Removes the record after `prompt` confirms; a declined prompt changes nothing.
    pub async fn delete<P>(
        &mut self,
        id: &EntityId,
        prompt: &P,
    ) -> Result<DeleteOutcome<R>, TableError>
    where
        P: ConfirmPrompt + ?Sized,
    {
        let label = entity_label::<R>().to_lowercase();
        let question = format!("Are you sure you want to delete this {label}?");
        if !prompt.confirm(&question) {
            info!(
                event_name = "master_data.delete_declined",
                correlation_id = %self.correlation_id,
                entity = R::ENTITY,
                record_id = %id,
                "delete declined at confirmation"
            );
            return Ok(DeleteOutcome::Declined);
        }

        let removed = match self.repository.delete(id).await {
            Ok(removed) => removed,
            Err(error) => {
                warn!(
                    event_name = "master_data.delete_failed",
                    correlation_id = %self.correlation_id,
                    entity = R::ENTITY,
                    record_id = %id,
                    error = %error,
                    "master-data delete failed"
                );
                return Err(error.into());
            }
        };
        info!(
            event_name = "master_data.record_deleted",
            correlation_id = %self.correlation_id,
            entity = R::ENTITY,
            record_id = %id,
            "master-data record deleted"
        );
        self.record_audit("master_data.record_deleted", id);
        self.notices
            .push(Notice::success(format!("{} deleted successfully", entity_label::<R>())));
        Ok(DeleteOutcome::Deleted(removed))
    }

    fn record_audit(&self, event_type: &str, id: &EntityId) {
        if let Some(sink) = &self.audit {
            sink.emit(
                AuditEvent::new(
                    None,
                    self.correlation_id.clone(),
                    event_type,
                    AuditCategory::MasterData,
                    self.actor.clone(),
                    AuditOutcome::Success,
                )
                .with_metadata("entity", R::ENTITY)
                .with_metadata("record_id", id.to_string()),
            );
        }
    }
}

/// `insurance_company` -> `Insurance company`.
pub fn entity_label<R: MasterRecord>() -> String {
    let spaced = R::ENTITY.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
