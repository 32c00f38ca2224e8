//! Database error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt column {column} for {name}: {reason}")]
    Corrupt { name: String, column: &'static str, reason: String },

    #[error("Migration v{version} failed: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Database connection lock poisoned")]
    LockPoisoned,

    #[error("Blocking task failed: {0}")]
    Task(String),
}
