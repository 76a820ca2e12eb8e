//! Data-access core for registrant (`CADASTRO`) records.
//! This crate owns the schema mapping, error taxonomy and store operations.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{
    ConnectionHandle, ConnectionProvider, DbError, DbResult, FileConnectionProvider,
    SharedConnectionProvider,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::lookup::{Region, RegionId, Term, TermId};
pub use model::registrant::{Registrant, RegistrantDraft, RegistrantId};
pub use repo::registrant_repo::{
    FailureKind, RegistrantRepository, RepoError, RepoResult, SqliteRegistrantRepository, TB_NAME,
};
pub use service::registrant_service::RegistrantService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
