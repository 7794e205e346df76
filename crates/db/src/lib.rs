pub mod fixtures;
pub mod repositories;

pub use fixtures::{EntityCount, MasterDataRepositories, SeedDataset, SeedResult};
pub use repositories::InMemoryRecordRepository;
