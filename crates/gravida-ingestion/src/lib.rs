//! gravida-ingestion: Drug-safety acquisition pipeline.
//! - Resilient fetching (identity rotation, backoff, connection caps)
//! - Page validity classification
//! - Heuristic extraction (category, risk level, notes, trimester, recommendations)
//! - Source adapters (drugs.com, e-lactancia, FDA Orange Book, drugs.com catalog)
//! - Multi-source consolidation with confidence scoring
//! - Run orchestration and progress accounting

pub mod consolidate;
pub mod extract;
pub mod fetch;
pub mod html;
pub mod models;
pub mod pacing;
pub mod pipeline;
pub mod sources;
pub mod validity;

pub use consolidate::{merge, merge_with, Consolidation, ConsolidationPolicy};
pub use fetch::{FetchPolicy, FetchResult, FetchStatus, Fetcher};
pub use models::{MedicationQuery, NoDataReason, PartialRecord, RegistryEntry, SourceOutcome};
pub use pacing::{DelayRange, PacingPolicy};
pub use pipeline::{MedicationOutcome, Orchestrator, OutcomeStatus, RunProgress, RunSummary};
pub use sources::SourceAdapter;
