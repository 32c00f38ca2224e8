//! Schema definitions and migrations for the SQLite store.

use rusqlite::Connection;

use crate::error::{DbError, Result};

pub const TABLE_MEDICATIONS: &str = "medications";

/// Column list shared by every SELECT so row mapping stays positional.
pub const MEDICATION_COLUMNS: &str = "name, risk_category, risk_level, notes, trimester_safety, \
     recommendations, observations, sources, confidence, updated_at";

/// Ordered migrations; `PRAGMA user_version` records the last one applied.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../migrations/001_medications.sql")),
];

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current = current_version(conn)?;

    for (version, sql) in MIGRATIONS {
        if *version > current {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DbError::MigrationFailed {
                version: *version,
                reason: e.to_string(),
            })?;
            conn.pragma_update(None, "user_version", version)?;
        }
    }

    Ok(())
}

/// Current schema version (0 for a fresh database).
pub fn current_version(conn: &Connection) -> Result<i64> {
    let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 1);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [TABLE_MEDICATIONS],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }
}
