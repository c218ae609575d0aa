//! Shared planet store used by HTTP handlers.
//!
//! # Responsibility
//! - Define `PlanetApi`, the capability set the controller depends on.
//! - Own the single SQLite connection shared across request tasks.
//! - Compose repository and service per call.
//!
//! # Invariants
//! - Store access is serialized through one mutex.
//! - Every call runs against a migrated connection.

use planet_core::db::{open_db, open_db_in_memory};
use planet_core::{
    Planet, PlanetId, PlanetService, RepoResult, SqlitePlanetRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::DbLocation;
use crate::ServeError;

/// Planet use-cases as seen by the HTTP controller.
///
/// Implementations block on store I/O; callers run them off the async
/// executor.
pub trait PlanetApi: Send + Sync + 'static {
    fn create(&self, planet: &Planet) -> RepoResult<Planet>;
    fn get(&self, id: PlanetId) -> RepoResult<Option<Planet>>;
    fn get_by_name(&self, name: &str) -> RepoResult<Option<Planet>>;
    fn list(&self, terrain: Option<&str>, climate: Option<&str>) -> RepoResult<Vec<Planet>>;
    fn remove(&self, id: PlanetId) -> RepoResult<()>;
}

/// Handle shared by router state.
pub type SharedPlanetApi = Arc<dyn PlanetApi>;

/// SQLite-backed `PlanetApi`.
pub struct SqlitePlanetStore {
    conn: Mutex<Connection>,
}

impl SqlitePlanetStore {
    /// Takes ownership of a connection after checking its schema.
    pub fn new(conn: Connection) -> RepoResult<Self> {
        SqlitePlanetRepository::try_new(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens the configured database, creating the schema if needed.
    pub fn open(location: &DbLocation) -> Result<Self, ServeError> {
        let conn = match location {
            DbLocation::Memory => open_db_in_memory()?,
            DbLocation::File(path) => open_db(path)?,
        };
        Ok(Self::new(conn)?)
    }

    fn with_planet_service<T>(
        &self,
        f: impl FnOnce(&PlanetService<SqlitePlanetRepository<'_>>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        // Statements are single-shot, so a panicked holder leaves no open transaction.
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let service = PlanetService::new(SqlitePlanetRepository::new(&conn));
        f(&service)
    }
}

impl PlanetApi for SqlitePlanetStore {
    fn create(&self, planet: &Planet) -> RepoResult<Planet> {
        self.with_planet_service(|service| service.create(planet))
    }

    fn get(&self, id: PlanetId) -> RepoResult<Option<Planet>> {
        self.with_planet_service(|service| service.get(id))
    }

    fn get_by_name(&self, name: &str) -> RepoResult<Option<Planet>> {
        self.with_planet_service(|service| service.get_by_name(name))
    }

    fn list(&self, terrain: Option<&str>, climate: Option<&str>) -> RepoResult<Vec<Planet>> {
        self.with_planet_service(|service| service.list(terrain, climate))
    }

    fn remove(&self, id: PlanetId) -> RepoResult<()> {
        self.with_planet_service(|service| service.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::{PlanetApi, SqlitePlanetStore};
    use crate::config::DbLocation;
    use planet_core::{Planet, RepoError};
    use rusqlite::Connection;

    #[test]
    fn store_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let result = SqlitePlanetStore::new(conn);
        assert!(matches!(
            result,
            Err(RepoError::UninitializedConnection { .. })
        ));
    }

    #[test]
    fn store_round_trips_through_service() {
        let store = SqlitePlanetStore::open(&DbLocation::Memory).unwrap();

        let created = store
            .create(&Planet::new("Tatooine", "arid", "desert"))
            .unwrap();
        let id = created.id.unwrap();

        assert_eq!(store.get(id).unwrap(), Some(created.clone()));
        assert_eq!(store.get_by_name("Tatooine").unwrap(), Some(created));
        assert_eq!(store.list(None, Some("arid")).unwrap().len(), 1);
        store.remove(id).unwrap();
        assert!(matches!(store.remove(id), Err(RepoError::NotFound(_))));
    }
}
