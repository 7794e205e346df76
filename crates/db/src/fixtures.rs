use std::sync::Arc;

use serde::{Deserialize, Serialize};

use covernote_core::domain::master_data::{
    Bank, Exam, InsuranceCompany, PolicyProduct, TrainingMaterial, VehicleType,
};
use covernote_core::ids::IdStrategy;
use covernote_core::master_data::{MasterRecord, RecordRepository, RepositoryError};

use crate::repositories::InMemoryRecordRepository;

/// Reference rows every master-data table starts from.
///
/// Ids are numeric so the sequential id strategy continues after them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedDataset {
    pub banks: Vec<Bank>,
    pub insurance_companies: Vec<InsuranceCompany>,
    pub vehicle_types: Vec<VehicleType>,
    pub policy_products: Vec<PolicyProduct>,
    pub exams: Vec<Exam>,
    pub training_materials: Vec<TrainingMaterial>,
}

impl SeedDataset {
    pub const JSON: &'static str = include_str!("../fixtures/master_data.json");

    /// Parses the bundled fixture and recomputes derived fields.
    pub fn load() -> Result<Self, RepositoryError> {
        let mut dataset: Self = serde_json::from_str(Self::JSON)
            .map_err(|error| RepositoryError::Storage(format!("seed fixture: {error}")))?;
        dataset.exams.iter_mut().for_each(|exam| exam.normalize());
        Ok(dataset)
    }

    pub fn repositories(self, strategy: IdStrategy) -> MasterDataRepositories {
        MasterDataRepositories {
            banks: Arc::new(InMemoryRecordRepository::seeded(self.banks, strategy)),
            insurance_companies: Arc::new(InMemoryRecordRepository::seeded(
                self.insurance_companies,
                strategy,
            )),
            vehicle_types: Arc::new(InMemoryRecordRepository::seeded(
                self.vehicle_types,
                strategy,
            )),
            policy_products: Arc::new(InMemoryRecordRepository::seeded(
                self.policy_products,
                strategy,
            )),
            exams: Arc::new(InMemoryRecordRepository::seeded(self.exams, strategy)),
            training_materials: Arc::new(InMemoryRecordRepository::seeded(
                self.training_materials,
                strategy,
            )),
        }
    }
}

/// One seeded repository per master-data entity.
#[derive(Clone)]
pub struct MasterDataRepositories {
    pub banks: Arc<InMemoryRecordRepository<Bank>>,
    pub insurance_companies: Arc<InMemoryRecordRepository<InsuranceCompany>>,
    pub vehicle_types: Arc<InMemoryRecordRepository<VehicleType>>,
    pub policy_products: Arc<InMemoryRecordRepository<PolicyProduct>>,
    pub exams: Arc<InMemoryRecordRepository<Exam>>,
    pub training_materials: Arc<InMemoryRecordRepository<TrainingMaterial>>,
}

impl MasterDataRepositories {
    pub async fn seed(strategy: IdStrategy) -> Result<SeedResult, RepositoryError> {
        let repositories = SeedDataset::load()?.repositories(strategy);
        let entities = repositories.counts().await?;
        Ok(SeedResult { repositories, entities })
    }

    pub async fn counts(&self) -> Result<Vec<EntityCount>, RepositoryError> {
        Ok(vec![
            count_of::<Bank>(self.banks.as_ref()).await?,
            count_of::<InsuranceCompany>(self.insurance_companies.as_ref()).await?,
            count_of::<VehicleType>(self.vehicle_types.as_ref()).await?,
            count_of::<PolicyProduct>(self.policy_products.as_ref()).await?,
            count_of::<Exam>(self.exams.as_ref()).await?,
            count_of::<TrainingMaterial>(self.training_materials.as_ref()).await?,
        ])
    }
}

async fn count_of<R: MasterRecord>(
    repository: &dyn RecordRepository<R>,
) -> Result<EntityCount, RepositoryError> {
    let records = repository.list().await?;
    let active = records.iter().filter(|record| record.is_active()).count();
    Ok(EntityCount { entity: R::ENTITY, total: records.len(), active })
}

pub struct SeedResult {
    pub repositories: MasterDataRepositories,
    pub entities: Vec<EntityCount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntityCount {
    pub entity: &'static str,
    pub total: usize,
    pub active: usize,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::SeedDataset;

    #[test]
    fn bundled_fixture_parses() {
        let dataset = SeedDataset::load().expect("fixture parses");

        assert!(!dataset.banks.is_empty());
        assert!(!dataset.insurance_companies.is_empty());
        assert!(!dataset.vehicle_types.is_empty());
        assert!(!dataset.policy_products.is_empty());
        assert!(!dataset.exams.is_empty());
        assert!(!dataset.training_materials.is_empty());
    }

    #[test]
    fn fixture_ids_are_numeric_and_unique_per_entity() {
        let dataset = SeedDataset::load().expect("fixture parses");
        let ids = dataset.banks.iter().map(|bank| bank.id.as_str()).collect::<Vec<_>>();

        assert!(ids.iter().all(|id| id.parse::<u64>().is_ok()));
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    }
}
