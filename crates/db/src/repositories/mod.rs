pub mod memory;

pub use memory::InMemoryRecordRepository;
