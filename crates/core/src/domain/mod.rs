pub mod approval;
pub mod cancellation;
pub mod endorsement;
pub mod master_data;
pub mod proposal;
pub mod request;
pub mod settlement;
pub mod upload;
pub mod verification;
