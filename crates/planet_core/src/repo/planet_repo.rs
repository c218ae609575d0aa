//! Planet repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide save/find/list/delete APIs over the `planets` table.
//! - Translate query-by-example filters into SQL predicates.
//! - Map store integrity failures onto semantic repository errors.
//!
//! # Invariants
//! - `save` validates before any SQL mutation.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - `find_all` results are ordered by `id` ascending.

use crate::db::schema::{schema_version, SCHEMA_VERSION};
use crate::db::DbError;
use crate::model::planet::{is_blank, Planet, PlanetId, PlanetValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PLANET_SELECT_SQL: &str = "SELECT id, name, climate, terrain FROM planets";
const PLANETS_TABLE: &str = "planets";
const REQUIRED_COLUMNS: &[&str] = &["id", "name", "climate", "terrain"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for planet persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(PlanetValidationError),
    /// A planet with this name already exists.
    Conflict(String),
    NotFound(PlanetId),
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(name) => write!(f, "planet name already exists: {name}"),
            Self::NotFound(id) => write!(f, "planet not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted planet data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PlanetValidationError> for RepoError {
    fn from(value: PlanetValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query-by-example template for listing planets.
///
/// A field contributes an equality predicate only when it is set and not
/// blank. Populated fields are AND-combined; matching is case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanetFilter {
    pub name: Option<String>,
    pub climate: Option<String>,
    pub terrain: Option<String>,
}

impl PlanetFilter {
    /// Builds a filter from an example planet. The example `id` is ignored.
    pub fn from_example(example: &Planet) -> Self {
        Self {
            name: non_blank(Some(example.name.as_str())),
            climate: non_blank(Some(example.climate.as_str())),
            terrain: non_blank(Some(example.terrain.as_str())),
        }
    }

    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = non_blank(name);
        self
    }

    pub fn with_climate(mut self, climate: Option<&str>) -> Self {
        self.climate = non_blank(climate);
        self
    }

    pub fn with_terrain(mut self, terrain: Option<&str>) -> Self {
        self.terrain = non_blank(terrain);
        self
    }

    /// Returns `(column, value)` pairs for every populated field.
    pub fn predicates(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", self.name.as_deref()),
            ("climate", self.climate.as_deref()),
            ("terrain", self.terrain.as_deref()),
        ]
        .into_iter()
        .filter_map(|(column, value)| match value {
            Some(value) if !is_blank(value) => Some((column, value)),
            _ => None,
        })
        .collect()
    }

    /// Returns whether this filter matches `planet`.
    pub fn matches(&self, planet: &Planet) -> bool {
        [
            (self.name.as_deref(), planet.name.as_str()),
            (self.climate.as_deref(), planet.climate.as_str()),
            (self.terrain.as_deref(), planet.terrain.as_str()),
        ]
        .into_iter()
        .all(|(wanted, actual)| match wanted {
            Some(wanted) if !is_blank(wanted) => wanted == actual,
            _ => true,
        })
    }
}

/// Translates a filter into a `WHERE` clause and its bind values.
///
/// Returns an empty clause when no field is populated.
pub fn filter_to_sql(filter: &PlanetFilter) -> (String, Vec<Value>) {
    let predicates = filter.predicates();
    if predicates.is_empty() {
        return (String::new(), Vec::new());
    }

    let clause = predicates
        .iter()
        .map(|(column, _)| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(" AND ");
    let values = predicates
        .into_iter()
        .map(|(_, value)| Value::Text(value.to_string()))
        .collect();

    (format!(" WHERE {clause}"), values)
}

/// Repository interface for planet persistence.
pub trait PlanetRepository {
    /// Inserts a new planet and returns it with the assigned id.
    fn save(&self, planet: &Planet) -> RepoResult<Planet>;
    fn find_by_id(&self, id: PlanetId) -> RepoResult<Option<Planet>>;
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Planet>>;
    /// Lists planets matching `filter`, ordered by id.
    fn find_all(&self, filter: &PlanetFilter) -> RepoResult<Vec<Planet>>;
    /// Hard-deletes one planet; `NotFound` when no row matched.
    fn delete_by_id(&self, id: PlanetId) -> RepoResult<()>;
}

/// SQLite-backed planet repository.
pub struct SqlitePlanetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePlanetRepository<'conn> {
    /// Wraps a connection already verified by `try_new` or opened through
    /// `db::open_db*`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection returned by `db::open_db*`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   does not carry the `planets` layout.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version = schema_version(conn)?;
        let expected_version = SCHEMA_VERSION;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        ensure_planets_schema(conn)?;
        Ok(Self { conn })
    }
}

impl PlanetRepository for SqlitePlanetRepository<'_> {
    fn save(&self, planet: &Planet) -> RepoResult<Planet> {
        planet.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO planets (name, climate, terrain) VALUES (?1, ?2, ?3);",
            params![
                planet.name.as_str(),
                planet.climate.as_str(),
                planet.terrain.as_str()
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::Conflict(planet.name.clone()));
            }
            Err(err) => return Err(err.into()),
        }

        let id = self.conn.last_insert_rowid();
        Ok(Planet {
            id: Some(id),
            name: planet.name.clone(),
            climate: planet.climate.clone(),
            terrain: planet.terrain.clone(),
        })
    }

    fn find_by_id(&self, id: PlanetId) -> RepoResult<Option<Planet>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PLANET_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_planet_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Planet>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PLANET_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_planet_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_all(&self, filter: &PlanetFilter) -> RepoResult<Vec<Planet>> {
        let (clause, bind_values) = filter_to_sql(filter);
        let sql = format!("{PLANET_SELECT_SQL}{clause} ORDER BY id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut planets = Vec::new();

        while let Some(row) = rows.next()? {
            planets.push(parse_planet_row(row)?);
        }

        Ok(planets)
    }

    fn delete_by_id(&self, id: PlanetId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM planets WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_planet_row(row: &Row<'_>) -> RepoResult<Planet> {
    let planet = Planet {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        climate: row.get("climate")?,
        terrain: row.get("terrain")?,
    };
    planet.validate().map_err(|err| {
        RepoError::InvalidData(format!("row {}: {err}", planet.id.unwrap_or_default()))
    })?;
    Ok(planet)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn ensure_planets_schema(conn: &Connection) -> RepoResult<()> {
    let table_exists = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [PLANETS_TABLE],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(PLANETS_TABLE));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({PLANETS_TABLE});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;

    for &column in REQUIRED_COLUMNS {
        if !columns.iter().any(|existing| existing.as_str() == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: PLANETS_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.filter(|value| !is_blank(value)).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{filter_to_sql, PlanetFilter};
    use crate::model::planet::Planet;
    use rusqlite::types::Value;

    #[test]
    fn empty_filter_produces_no_clause() {
        let (clause, values) = filter_to_sql(&PlanetFilter::default());
        assert!(clause.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn populated_fields_are_and_combined_in_column_order() {
        let filter = PlanetFilter::default()
            .with_terrain(Some("desert"))
            .with_climate(Some("arid"));

        let (clause, values) = filter_to_sql(&filter);
        assert_eq!(clause, " WHERE climate = ? AND terrain = ?");
        assert_eq!(
            values,
            vec![
                Value::Text("arid".to_string()),
                Value::Text("desert".to_string())
            ]
        );
    }

    #[test]
    fn blank_values_do_not_contribute_predicates() {
        let filter = PlanetFilter::default()
            .with_climate(Some("   "))
            .with_terrain(None);
        assert!(filter.predicates().is_empty());
    }

    #[test]
    fn from_example_ignores_id_and_empty_fields() {
        let example = Planet::new("", "temperate", "").with_id(7);
        let filter = PlanetFilter::from_example(&example);

        assert_eq!(filter.predicates(), vec![("climate", "temperate")]);
    }

    #[test]
    fn matches_is_exact_and_case_sensitive() {
        let planet = Planet::new("Alderaan", "temperate", "grasslands, mountains");
        let filter = PlanetFilter::default().with_climate(Some("Temperate"));
        assert!(!filter.matches(&planet));
        assert!(PlanetFilter::default()
            .with_terrain(Some("grasslands, mountains"))
            .matches(&planet));
    }

    #[test]
    fn matches_checks_every_populated_field() {
        let planet = Planet::new("Alderaan", "temperate", "grasslands, mountains");
        let full = PlanetFilter::from_example(&planet);
        assert!(full.matches(&planet));

        assert!(!full.clone().with_name(Some("Hoth")).matches(&planet));
        assert!(!full.clone().with_climate(Some("frozen")).matches(&planet));
        assert!(!full.with_terrain(Some("tundra")).matches(&planet));
        assert!(!PlanetFilter::default()
            .with_name(Some("Hoth"))
            .matches(&planet));
    }
}
