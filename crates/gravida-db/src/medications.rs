//! Medication repository.
//!
//! Idempotent upsert of consolidated records keyed by normalised name, plus
//! the read paths used by reporting.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use gravida_common::text::normalize_name;
use gravida_common::{ConsolidatedRecord, RiskCategory, RiskLevel, SourceId, TrimesterSafety};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::schema::MEDICATION_COLUMNS;

/// Storage interface for consolidated medication records.
#[async_trait]
pub trait MedicationRepository: Send + Sync {
    /// Insert or overwrite the record with the same normalised name.
    async fn upsert(&self, record: &ConsolidatedRecord) -> Result<()>;

    /// All records ordered by name.
    async fn read_all(&self) -> Result<Vec<ConsolidatedRecord>>;

    /// Look a record up by name (normalised before comparison).
    async fn find_by_name(&self, name: &str) -> Result<Option<ConsolidatedRecord>>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize>;
}

/// SQLite-backed repository.
#[derive(Clone)]
pub struct SqliteMedicationRepository {
    db: Database,
}

impl SqliteMedicationRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl MedicationRepository for SqliteMedicationRepository {
    async fn upsert(&self, record: &ConsolidatedRecord) -> Result<()> {
        let row = StoredRow::from_record(record)?;
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO medications (name, risk_category, risk_level, notes, trimester_safety,
                                              recommendations, observations, sources, confidence, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                     ON CONFLICT(name) DO UPDATE SET
                       risk_category    = excluded.risk_category,
                       risk_level       = excluded.risk_level,
                       notes            = excluded.notes,
                       trimester_safety = excluded.trimester_safety,
                       recommendations  = excluded.recommendations,
                       observations     = excluded.observations,
                       sources          = excluded.sources,
                       confidence       = excluded.confidence,
                       updated_at       = excluded.updated_at",
                    params![
                        row.name,
                        row.risk_category,
                        row.risk_level,
                        row.notes,
                        row.trimester_safety,
                        row.recommendations,
                        row.observations,
                        row.sources,
                        row.confidence,
                        row.updated_at,
                    ],
                )?;
                tracing::debug!(name = %row.name, confidence = row.confidence, "Medication upserted");
                Ok(())
            })
            .await
    }

    async fn read_all(&self) -> Result<Vec<ConsolidatedRecord>> {
        let rows = self
            .db
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {MEDICATION_COLUMNS} FROM medications ORDER BY name"
                ))?;
                let rows = stmt
                    .query_map([], StoredRow::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;

        rows.into_iter().map(StoredRow::into_record).collect()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ConsolidatedRecord>> {
        let key = normalize_name(name);
        let row = self
            .db
            .call(move |conn| find_row(conn, &key))
            .await?;
        row.map(StoredRow::into_record).transpose()
    }

    async fn count(&self) -> Result<usize> {
        let n: i64 = self
            .db
            .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM medications", [], |row| row.get(0))?))
            .await?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

fn find_row(conn: &Connection, key: &str) -> Result<Option<StoredRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {MEDICATION_COLUMNS} FROM medications WHERE name = ?1"),
            [key],
            StoredRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Column-level representation of a record.
struct StoredRow {
    name: String,
    risk_category: Option<String>,
    risk_level: Option<String>,
    notes: Option<String>,
    trimester_safety: Option<String>,
    recommendations: Option<String>,
    observations: Option<String>,
    sources: String,
    confidence: i64,
    updated_at: String,
}

impl StoredRow {
    fn from_record(record: &ConsolidatedRecord) -> Result<Self> {
        let sources: Vec<&str> = record.sources.iter().map(SourceId::as_str).collect();
        Ok(Self {
            name: normalize_name(&record.name),
            risk_category: record.risk_category.map(|c| c.as_str().to_string()),
            risk_level: record.risk_level.map(|l| l.label().to_string()),
            notes: record.notes.clone(),
            trimester_safety: record
                .trimester_safety
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string()),
            recommendations: record.recommendations.clone(),
            observations: record.observations.clone(),
            sources: serde_json::to_string(&sources)?,
            confidence: i64::from(record.confidence),
            updated_at: record.updated_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        })
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            risk_category: row.get(1)?,
            risk_level: row.get(2)?,
            notes: row.get(3)?,
            trimester_safety: row.get(4)?,
            recommendations: row.get(5)?,
            observations: row.get(6)?,
            sources: row.get(7)?,
            confidence: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<ConsolidatedRecord> {
        let corrupt = |column: &'static str, reason: String| DbError::Corrupt {
            name: self.name.clone(),
            column,
            reason,
        };

        let risk_category = self
            .risk_category
            .as_deref()
            .map(str::parse::<RiskCategory>)
            .transpose()
            .map_err(|e| corrupt("risk_category", e.to_string()))?;

        let risk_level = match self.risk_level.as_deref() {
            Some(label) => Some(
                RiskLevel::from_label(label)
                    .ok_or_else(|| corrupt("risk_level", format!("unknown label {label}")))?,
            ),
            None => None,
        };

        let trimester_safety = self
            .trimester_safety
            .as_deref()
            .map(str::parse::<TrimesterSafety>)
            .transpose()
            .map_err(|e| corrupt("trimester_safety", e.to_string()))?;

        let source_names: Vec<String> = serde_json::from_str(&self.sources)?;
        let sources = source_names
            .iter()
            .map(|s| s.parse::<SourceId>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| corrupt("sources", e.to_string()))?;

        let confidence = u32::try_from(self.confidence)
            .map_err(|e| corrupt("confidence", e.to_string()))?;

        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map_err(|e| corrupt("updated_at", e.to_string()))?
            .with_timezone(&Utc);

        Ok(ConsolidatedRecord {
            name: self.name,
            risk_category,
            risk_level,
            notes: self.notes,
            trimester_safety,
            recommendations: self.recommendations,
            observations: self.observations,
            sources,
            confidence,
            updated_at,
        })
    }
}
