pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod repository;
pub mod service;

pub use error::*;
pub use handlers::*;
pub use ledger::{apply_delta, guard_delta, points_for_amount, LedgerError};
pub use models::*;
pub use repository::*;
pub use service::*;
