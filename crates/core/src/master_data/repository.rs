use async_trait::async_trait;
use thiserror::Error;

use crate::ids::EntityId;

use super::record::MasterRecord;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: EntityId },
    #[error("storage error: {0}")]
    Storage(String),
}

/// Collection of one master-data entity.
///
/// Implementations assign identifiers on `create` and keep the stored id and
/// creation stamp on `update`.
#[async_trait]
pub trait RecordRepository<R: MasterRecord>: Send + Sync {
    async fn list(&self) -> Result<Vec<R>, RepositoryError>;

    async fn find_by_id(&self, id: &EntityId) -> Result<Option<R>, RepositoryError>;

    async fn create(&self, record: R) -> Result<R, RepositoryError>;

    async fn update(&self, record: R) -> Result<R, RepositoryError>;

    async fn delete(&self, id: &EntityId) -> Result<R, RepositoryError>;

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.list().await?.len())
    }
}
