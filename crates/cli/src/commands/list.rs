use std::sync::Arc;

use covernote_core::config::{AppConfig, LoadOptions};
use covernote_core::domain::master_data::{
    Bank, Exam, InsuranceCompany, PolicyProduct, TrainingMaterial, VehicleType,
};
use covernote_core::master_data::{
    FacetSelection, MasterDataTable, MasterRecord, RecordRepository, TableError, STATUS_FACET,
    TYPE_FACET,
};
use covernote_db::{MasterDataRepositories, SeedDataset};
use serde_json::Value;

use crate::commands::{runtime, CommandResult};
use crate::EntityArg;

#[derive(Clone, Debug, Default)]
pub struct ListFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub kind: Option<String>,
}

struct Listing {
    entity: &'static str,
    total: usize,
    matched: usize,
    rows: Value,
}

pub fn run(entity: EntityArg, filter: ListFilter) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "list",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let repositories = match SeedDataset::load() {
        Ok(dataset) => dataset.repositories(config.master_data.id_strategy),
        Err(error) => return CommandResult::failure("list", "seed_execution", error.to_string(), 5),
    };

    let runtime = match runtime("list") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let actor = config.master_data.actor;
    match runtime.block_on(list_entity(&repositories, entity, &filter, actor)) {
        Ok(listing) => {
            let message =
                format!("{} of {} {} rows match", listing.matched, listing.total, listing.entity);
            CommandResult::success_with_data("list", message, Some(listing.rows))
        }
        Err(error) => CommandResult::failure("list", "repository", error.to_string(), 5),
    }
}

async fn list_entity(
    repositories: &MasterDataRepositories,
    entity: EntityArg,
    filter: &ListFilter,
    actor: String,
) -> Result<Listing, TableError> {
    match entity {
        EntityArg::Bank => listing::<Bank>(repositories.banks.clone(), filter, actor).await,
        EntityArg::InsuranceCompany => {
            listing::<InsuranceCompany>(repositories.insurance_companies.clone(), filter, actor)
                .await
        }
        EntityArg::VehicleType => {
            listing::<VehicleType>(repositories.vehicle_types.clone(), filter, actor).await
        }
        EntityArg::PolicyProduct => {
            listing::<PolicyProduct>(repositories.policy_products.clone(), filter, actor).await
        }
        EntityArg::Exam => listing::<Exam>(repositories.exams.clone(), filter, actor).await,
        EntityArg::TrainingMaterial => {
            listing::<TrainingMaterial>(repositories.training_materials.clone(), filter, actor)
                .await
        }
    }
}

async fn listing<R: MasterRecord>(
    repository: Arc<dyn RecordRepository<R>>,
    filter: &ListFilter,
    actor: String,
) -> Result<Listing, TableError> {
    let mut table = MasterDataTable::new(repository, actor);
    if let Some(search) = &filter.search {
        table.set_search(search.clone());
    }
    if let Some(status) = &filter.status {
        table.set_facet(STATUS_FACET, FacetSelection::parse(status));
    }
    if let Some(kind) = &filter.kind {
        table.set_facet(TYPE_FACET, FacetSelection::parse(kind));
    }

    let total = table.total().await?;
    let rows = table.rows().await?;
    let matched = rows.len();
    let rows = serde_json::to_value(rows).unwrap_or_default();
    Ok(Listing { entity: R::ENTITY, total, matched, rows })
}

#[cfg(test)]
mod tests {
    use covernote_core::ids::IdStrategy;
    use covernote_db::SeedDataset;

    use super::{list_entity, ListFilter};
    use crate::EntityArg;

    #[tokio::test]
    async fn status_and_kind_filters_narrow_vehicle_types() {
        let repositories =
            SeedDataset::load().expect("fixture parses").repositories(IdStrategy::Sequential);
        let filter = ListFilter {
            status: Some("active".to_owned()),
            kind: Some("commercial".to_owned()),
            ..ListFilter::default()
        };

        let listing = list_entity(&repositories, EntityArg::VehicleType, &filter, "ops".to_owned())
            .await
            .expect("listing");

        assert_eq!(listing.entity, "vehicle_type");
        assert_eq!(listing.total, 4);
        assert_eq!(listing.matched, 1);
        assert_eq!(listing.rows[0]["type_code"], "GCV");
    }

    #[tokio::test]
    async fn all_selection_keeps_every_row() {
        let repositories =
            SeedDataset::load().expect("fixture parses").repositories(IdStrategy::Sequential);
        let filter = ListFilter { status: Some("All".to_owned()), ..ListFilter::default() };

        let listing = list_entity(&repositories, EntityArg::Bank, &filter, "ops".to_owned())
            .await
            .expect("listing");

        assert_eq!(listing.matched, listing.total);
    }
}
