//! Planet use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/remove entry points for planet callers.
//! - Build query-by-example filters for listing.
//!
//! # Invariants
//! - Repository errors are returned unchanged.
//! - The service holds no state besides its repository and never caches.

use crate::model::planet::{Planet, PlanetId};
use crate::repo::planet_repo::{PlanetFilter, PlanetRepository, RepoResult};

/// Use-case service wrapper for planet operations.
pub struct PlanetService<R: PlanetRepository> {
    repo: R,
}

impl<R: PlanetRepository> PlanetService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the wrapped repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Persists a new planet and returns it with the assigned id.
    pub fn create(&self, planet: &Planet) -> RepoResult<Planet> {
        self.repo.save(planet)
    }

    pub fn get(&self, id: PlanetId) -> RepoResult<Option<Planet>> {
        self.repo.find_by_id(id)
    }

    pub fn get_by_name(&self, name: &str) -> RepoResult<Option<Planet>> {
        self.repo.find_by_name(name)
    }

    /// Lists planets, filtering on whichever of `terrain`/`climate` is
    /// non-empty. With neither set every planet is returned.
    pub fn list(&self, terrain: Option<&str>, climate: Option<&str>) -> RepoResult<Vec<Planet>> {
        let filter = PlanetFilter::default()
            .with_terrain(terrain)
            .with_climate(climate);
        self.repo.find_all(&filter)
    }

    /// Deletes a planet by id; `RepoError::NotFound` when absent.
    pub fn remove(&self, id: PlanetId) -> RepoResult<()> {
        self.repo.delete_by_id(id)
    }
}
