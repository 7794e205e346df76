//! Master-data tables: filtered listing and CRUD over reference entities.

pub mod filter;
pub mod record;
pub mod repository;
pub mod table;

pub use filter::{apply_filter, FacetSelection, RecordFilter};
pub use record::{MasterRecord, STATUS_FACET, TYPE_FACET};
pub use repository::{RecordRepository, RepositoryError};
pub use table::{
    entity_label, ConfirmPrompt, DeleteOutcome, MasterDataTable, ModalState, TableError,
};
