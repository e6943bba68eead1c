//! Core domain logic for the part store.
//! This crate owns the part aggregate, its repository contract and the
//! storage bootstrap behind it.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::part::{
    Attribute, AttributeId, Fitment, Image, Metadata, Part, PartId, PartValidationError,
    ShipmentPackaging,
};
pub use repo::part_repo::{PartRepository, RepoError, RepoResult, SqlitePartRepository};
pub use service::part_service::{PartService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
