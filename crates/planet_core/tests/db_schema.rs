use planet_core::db::schema::{schema_version, SCHEMA_VERSION};
use planet_core::db::{open_db, open_db_in_memory, DbError};
use planet_core::{Planet, PlanetRepository, SqlitePlanetRepository};
use rusqlite::Connection;

fn planets_table_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'planets';",
        [],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn fresh_in_memory_store_is_created_at_current_version() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    assert_eq!(planets_table_count(&conn), 1);
}

#[test]
fn reopening_file_store_keeps_existing_planets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planets.db");

    {
        let conn = open_db(&path).unwrap();
        SqlitePlanetRepository::new(&conn)
            .save(&Planet::new("Bespin", "temperate", "gas giant"))
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    let found = SqlitePlanetRepository::new(&conn)
        .find_by_name("Bespin")
        .unwrap();
    assert_eq!(found.and_then(|planet| planet.id), Some(1));
}

#[test]
fn store_with_unknown_schema_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path) {
        Err(DbError::UnknownSchemaVersion { found }) => assert_eq!(found, 999),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected unknown schema version error"),
    }
}

#[test]
fn schema_enforces_unique_names_and_non_blank_fields() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO planets (name, climate, terrain) VALUES ('Hoth', 'frozen', 'tundra');",
        [],
    )
    .unwrap();

    let duplicate = conn.execute(
        "INSERT INTO planets (name, climate, terrain) VALUES ('Hoth', 'arid', 'desert');",
        [],
    );
    assert!(duplicate.is_err());

    let blank = conn.execute(
        "INSERT INTO planets (name, climate, terrain) VALUES ('Dagobah', '  ', 'swamp');",
        [],
    );
    assert!(blank.is_err());
}
