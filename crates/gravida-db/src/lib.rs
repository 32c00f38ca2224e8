//! Gravida Database Layer
//!
//! Embedded SQLite storage for consolidated medication records.
//!
//! # Example
//!
//! ```rust,no_run
//! use gravida_db::{Database, MedicationRepository, SqliteMedicationRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open("./db/medicamentos.db")?;
//!     let repo = SqliteMedicationRepository::new(db);
//!     println!("{} records", repo.count().await?);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod medications;
pub mod report;
pub mod schema;

pub use database::Database;
pub use error::{DbError, Result};
pub use medications::{MedicationRepository, SqliteMedicationRepository};
pub use report::ValidationReport;
pub use schema::TABLE_MEDICATIONS;
