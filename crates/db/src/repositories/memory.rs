use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use covernote_core::ids::{generator_for, EntityId, IdGenerator, IdStrategy};
use covernote_core::master_data::{MasterRecord, RecordRepository, RepositoryError};

/// Insertion-ordered in-memory collection of one master-data entity.
pub struct InMemoryRecordRepository<R: MasterRecord> {
    records: RwLock<Vec<R>>,
    ids: Arc<dyn IdGenerator>,
}

impl<R: MasterRecord> InMemoryRecordRepository<R> {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { records: RwLock::new(Vec::new()), ids }
    }

    /// Starts from `records`; sequential ids continue after the largest seeded id.
    pub fn seeded(records: Vec<R>, strategy: IdStrategy) -> Self {
        let ids = generator_for(strategy, records.iter().map(|record| record.id()));
        Self { records: RwLock::new(records), ids }
    }
}

impl<R: MasterRecord> Default for InMemoryRecordRepository<R> {
    fn default() -> Self {
        Self::seeded(Vec::new(), IdStrategy::Sequential)
    }
}

fn not_found<R: MasterRecord>(id: &EntityId) -> RepositoryError {
    RepositoryError::NotFound { entity: R::ENTITY, id: id.clone() }
}

#[async_trait]
impl<R: MasterRecord> RecordRepository<R> for InMemoryRecordRepository<R> {
    async fn list(&self) -> Result<Vec<R>, RepositoryError> {
        Ok(self.records.read().await.clone())
    }

    async fn find_by_id(&self, id: &EntityId) -> Result<Option<R>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|record| record.id() == id).cloned())
    }

    async fn create(&self, mut record: R) -> Result<R, RepositoryError> {
        let mut records = self.records.write().await;
        let id = self.ids.next_id();
        if records.iter().any(|existing| existing.id() == &id) {
            return Err(RepositoryError::Storage(format!(
                "{} id `{id}` is already in use",
                R::ENTITY
            )));
        }

        record.assign_id(id);
        records.push(record.clone());
        debug!(
            event_name = "db.record_inserted",
            entity = R::ENTITY,
            record_id = %record.id(),
            total = records.len(),
            "record inserted"
        );
        Ok(record)
    }

    async fn update(&self, mut record: R) -> Result<R, RepositoryError> {
        let mut records = self.records.write().await;
        let stored = records
            .iter_mut()
            .find(|existing| existing.id() == record.id())
            .ok_or_else(|| not_found::<R>(record.id()))?;

        let created = stored.audit().clone();
        let stamp = record.audit_mut();
        stamp.created_by = created.created_by;
        stamp.created_at = created.created_at;
        *stored = record.clone();

        debug!(
            event_name = "db.record_replaced",
            entity = R::ENTITY,
            record_id = %record.id(),
            "record replaced"
        );
        Ok(record)
    }

    async fn delete(&self, id: &EntityId) -> Result<R, RepositoryError> {
        let mut records = self.records.write().await;
        let position = records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| not_found::<R>(id))?;

        let removed = records.remove(position);
        debug!(
            event_name = "db.record_removed",
            entity = R::ENTITY,
            record_id = %id,
            total = records.len(),
            "record removed"
        );
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.records.read().await.len())
    }
}
