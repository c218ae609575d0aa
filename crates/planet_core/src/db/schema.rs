//! The `planets` schema and its version marker.

use super::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// Version written to `PRAGMA user_version` once the table exists.
pub const SCHEMA_VERSION: u32 = 1;

const PLANETS_DDL: &str = include_str!("planets.sql");

/// Reads the schema version recorded on the connection.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Creates the `planets` table on a fresh database.
///
/// A database already at `SCHEMA_VERSION` is left alone; any other non-zero
/// version is refused.
pub(crate) fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    match schema_version(conn)? {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.transaction()?;
            tx.execute_batch(PLANETS_DDL)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            info!("event=db_schema module=db status=ok created_version={SCHEMA_VERSION}");
            Ok(())
        }
        found => Err(DbError::UnknownSchemaVersion { found }),
    }
}
