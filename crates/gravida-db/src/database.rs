//! Database connection management.
//!
//! A single SQLite connection guarded by a mutex. Every call runs on the
//! blocking pool, so one upsert is one serialized, atomic statement.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::error::{DbError, Result};
use crate::schema;

/// Main database handle.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: String,
}

impl Database {
    /// Open or create a database at the specified path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn, path.to_string_lossy().to_string())
    }

    /// Open an in-memory database (tests, dry runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, ":memory:".to_string())
    }

    fn from_connection(conn: Connection, path: String) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode=DELETE;")?;
        schema::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run `f` against the connection on the blocking thread pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| DbError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .map_err(|e| DbError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("medicamentos.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert!(db.path().ends_with("medicamentos.db"));
    }

    #[tokio::test]
    async fn test_call_runs_on_connection() {
        let db = Database::open_in_memory().unwrap();
        let n: i64 = db
            .call(|conn| Ok(conn.query_row("SELECT 41 + 1", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(n, 42);
    }
}
