use crate::commands::{runtime, CommandResult};
use covernote_core::config::{AppConfig, LoadOptions};
use covernote_db::{EntityCount, MasterDataRepositories};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let seeded = runtime.block_on(MasterDataRepositories::seed(config.master_data.id_strategy));
    match seeded {
        Ok(seeded) => {
            let data = serde_json::to_value(&seeded.entities).ok();
            CommandResult::success_with_data("seed", summary(&seeded.entities), data)
        }
        Err(error) => CommandResult::failure("seed", "seed_execution", error.to_string(), 5),
    }
}

fn summary(entities: &[EntityCount]) -> String {
    let lines = entities
        .iter()
        .map(|count| {
            format!("  - {}: {} rows ({} active)", count.entity, count.total, count.active)
        })
        .collect::<Vec<_>>();
    format!("master-data fixtures loaded for {} entities:\n{}", entities.len(), lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use covernote_db::EntityCount;

    use super::summary;

    #[test]
    fn summary_lists_each_entity_with_active_count() {
        let message = summary(&[
            EntityCount { entity: "bank", total: 4, active: 3 },
            EntityCount { entity: "exam", total: 3, active: 3 },
        ]);

        assert_eq!(
            message,
            "master-data fixtures loaded for 2 entities:\n\
             \x20 - bank: 4 rows (3 active)\n\
             \x20 - exam: 3 rows (3 active)"
        );
    }
}
