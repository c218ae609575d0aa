//! Core domain logic for the planet API.
//! This crate owns the planet invariants, storage and use-case layers.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::planet::{Planet, PlanetId, PlanetValidationError};
pub use repo::planet_repo::{
    PlanetFilter, PlanetRepository, RepoError, RepoResult, SqlitePlanetRepository,
};
pub use service::planet_service::PlanetService;

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
