pub mod error;
pub mod handlers;
pub mod models;
pub mod ranking;
pub mod repository;
pub mod service;

pub use error::*;
pub use handlers::*;
pub use models::*;
pub use ranking::*;
pub use repository::*;
pub use service::*;
