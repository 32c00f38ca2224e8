//! Run orchestration.
//!
//! Drives the medication list strictly in order, and for each medication
//! queries its sources strictly in priority order:
//!   1. resolve each source (politeness delay between sources)
//!   2. consolidate the partial records
//!   3. upsert sufficient records, report insufficient ones
//!   4. fold the outcome into the run summary and emit progress
//!
//! Nothing a single medication does can abort the run: source failures are
//! already `NoData`, repository errors and panics become a failed outcome.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use gravida_common::SourceId;
use gravida_db::MedicationRepository;

use crate::consolidate::{merge_with, Consolidation, ConsolidationPolicy};
use crate::fetch::Fetcher;
use crate::models::{MedicationQuery, NoDataReason, SourceOutcome};
use crate::pacing::PacingPolicy;
use crate::sources::{adapter_for, CatalogSource, SourceAdapter};

/// Progress log cadence, in medications.
const PROGRESS_EVERY: usize = 5;

// ── Outcomes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Persisted,
    Insufficient,
    Failed(String),
}

/// Result of processing one medication.
#[derive(Debug, Clone)]
pub struct MedicationOutcome {
    pub name: String,
    pub status: OutcomeStatus,
    pub confidence: u32,
    pub sources: Vec<SourceId>,
    pub source_outcomes: Vec<(SourceId, SourceOutcome)>,
}

impl MedicationOutcome {
    fn failed(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: OutcomeStatus::Failed(message),
            confidence: 0,
            sources: Vec::new(),
            source_outcomes: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Persisted
    }
}

// ── Progress events ───────────────────────────────────────────────────────────

/// Emitted after every medication (cloneable for broadcast).
#[derive(Debug, Clone, Serialize)]
pub struct RunProgress {
    pub run_id: Uuid,
    pub index: usize,
    pub total: usize,
    pub name: String,
    pub status: OutcomeStatus,
    pub succeeded: usize,
    pub failed: usize,
}

// ── Run summary ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub total: usize,
    pub succeeded: usize,
    /// Includes insufficient medications.
    pub failed: usize,
    pub insufficient: usize,
    pub errors: Vec<String>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            total,
            succeeded: 0,
            failed: 0,
            insufficient: 0,
            errors: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn record(&mut self, outcome: &MedicationOutcome) {
        match &outcome.status {
            OutcomeStatus::Persisted => self.succeeded += 1,
            OutcomeStatus::Insufficient => {
                self.failed += 1;
                self.insufficient += 1;
            }
            OutcomeStatus::Failed(message) => {
                self.failed += 1;
                self.errors.push(format!("{}: {message}", outcome.name));
            }
        }
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {} finished", self.run_id)?;
        writeln!(f, "  processed:    {}/{}", self.processed(), self.total)?;
        writeln!(f, "  succeeded:    {}", self.succeeded)?;
        writeln!(f, "  failed:       {} ({} insufficient)", self.failed, self.insufficient)?;
        write!(f, "  elapsed:      {:.2} min", self.elapsed.as_secs_f64() / 60.0)
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

pub struct Orchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    catalog: Option<CatalogSource>,
    repo: Arc<dyn MedicationRepository>,
    policy: ConsolidationPolicy,
    pacing: PacingPolicy,
    progress_tx: Option<broadcast::Sender<RunProgress>>,
}

impl Orchestrator {
    pub fn new(repo: Arc<dyn MedicationRepository>, policy: ConsolidationPolicy, pacing: PacingPolicy) -> Self {
        Self {
            adapters: Vec::new(),
            catalog: None,
            repo,
            policy,
            pacing,
            progress_tx: None,
        }
    }

    /// Adapters for every enabled per-medication source plus the bulk catalog.
    pub fn with_sources(
        fetcher: &Fetcher,
        enabled: &[SourceId],
        repo: Arc<dyn MedicationRepository>,
        policy: ConsolidationPolicy,
        pacing: PacingPolicy,
    ) -> Self {
        let mut orchestrator = Self::new(repo, policy, pacing);
        for id in enabled {
            if let Some(adapter) = adapter_for(*id, fetcher, &pacing) {
                orchestrator = orchestrator.with_adapter(adapter);
            }
        }
        orchestrator.with_catalog(CatalogSource::new(fetcher.clone(), pacing.catalog_item_delay))
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn with_catalog(mut self, catalog: CatalogSource) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_progress(mut self, tx: broadcast::Sender<RunProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Enabled sources in priority order; these become each query's source list.
    pub fn source_order(&self) -> Vec<SourceId> {
        let mut ordered: Vec<SourceId> = self
            .policy
            .priority
            .iter()
            .copied()
            .filter(|id| self.adapters.iter().any(|a| a.id() == *id))
            .collect();
        for adapter in &self.adapters {
            if !ordered.contains(&adapter.id()) {
                ordered.push(adapter.id());
            }
        }
        ordered
    }

    /// Process `queries` in order and return the run summary.
    #[instrument(skip(self, queries), fields(total = queries.len()))]
    pub async fn run(&self, queries: &[MedicationQuery]) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::new(queries.len());
        info!(run_id = %summary.run_id, total = queries.len(), "Starting run");

        for (i, query) in queries.iter().enumerate() {
            if i > 0 {
                self.pacing.between_medications.wait("between medications").await;
            }
            info!("[{}/{}] Processing {}", i + 1, queries.len(), query.name);

            let outcome = AssertUnwindSafe(self.process_medication(query))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let message = panic_message(panic.as_ref());
                    error!(name = %query.name, error = %message, "Medication processing panicked");
                    MedicationOutcome::failed(&query.name, format!("panic: {message}"))
                });

            summary.record(&outcome);
            self.emit(&summary, i, &outcome);

            if (i + 1) % PROGRESS_EVERY == 0 {
                let elapsed = started.elapsed();
                let remaining = queries.len() - (i + 1);
                let eta_min = elapsed.as_secs_f64() / (i + 1) as f64 * remaining as f64 / 60.0;
                info!(
                    done = i + 1,
                    total = queries.len(),
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    eta_min = %format!("{eta_min:.1}"),
                    "Progress"
                );
            }
        }

        summary.elapsed = started.elapsed();
        info!(
            run_id = %summary.run_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            insufficient = summary.insufficient,
            elapsed_min = %format!("{:.2}", summary.elapsed.as_secs_f64() / 60.0),
            "Run complete"
        );
        summary
    }

    /// Resolve every source for one medication, consolidate, persist.
    pub async fn process_medication(&self, query: &MedicationQuery) -> MedicationOutcome {
        let mut source_outcomes: Vec<(SourceId, SourceOutcome)> = Vec::new();
        let mut partials = Vec::new();
        let mut queried = 0usize;

        for source_id in &query.sources {
            let Some(adapter) = self.adapters.iter().find(|a| a.id() == *source_id) else {
                source_outcomes.push((*source_id, SourceOutcome::NoData(NoDataReason::Unsupported)));
                continue;
            };
            if queried > 0 {
                self.pacing.between_sources.wait("between sources").await;
            }
            queried += 1;

            let outcome = adapter.resolve(query).await;
            info!(name = %query.name, source = %source_id, outcome = %outcome, "Source resolved");
            if let Some(partial) = outcome.partial() {
                partials.push(partial.clone());
            }
            source_outcomes.push((*source_id, outcome));
        }

        let consolidation = merge_with(&partials, &self.policy);
        let confidence = consolidation.confidence();
        let sources = consolidation.sources().to_vec();

        let status = match consolidation {
            Consolidation::Record(record) => match self.repo.upsert(&record).await {
                Ok(()) => {
                    info!(
                        name = %record.name,
                        category = %record.risk_category.map(|c| c.to_string()).unwrap_or_else(|| "N/A".into()),
                        confidence,
                        "Saved"
                    );
                    OutcomeStatus::Persisted
                }
                Err(e) => {
                    error!(name = %query.name, error = %e, "Failed to persist record");
                    OutcomeStatus::Failed(e.to_string())
                }
            },
            Consolidation::Insufficient { .. } => {
                warn!(name = %query.name, confidence, min = self.policy.min_confidence, "Insufficient data, not saved");
                OutcomeStatus::Insufficient
            }
        };

        MedicationOutcome {
            name: query.name.clone(),
            status,
            confidence,
            sources,
            source_outcomes,
        }
    }

    /// Crawl the bulk catalog, persisting each item as it is parsed.
    #[instrument(skip(self))]
    pub async fn run_catalog(&self, limit: Option<usize>) -> RunSummary {
        let started = Instant::now();
        let Some(catalog) = &self.catalog else {
            let mut summary = RunSummary::new(0);
            summary.errors.push("catalog source not configured".to_string());
            return summary;
        };

        let urls = catalog.item_urls(limit).await;
        let mut summary = RunSummary::new(urls.len());
        info!(run_id = %summary.run_id, items = urls.len(), "Starting catalog crawl");

        for (i, url) in urls.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(catalog.item_delay()).await;
            }
            let outcome = AssertUnwindSafe(self.process_catalog_item(catalog, url))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let message = panic_message(panic.as_ref());
                    error!(url = %url, error = %message, "Catalog item panicked");
                    MedicationOutcome::failed(url, format!("panic: {message}"))
                });
            summary.record(&outcome);
            self.emit(&summary, i, &outcome);
        }

        summary.elapsed = started.elapsed();
        info!(
            run_id = %summary.run_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Catalog crawl complete"
        );
        summary
    }

    async fn process_catalog_item(&self, catalog: &CatalogSource, url: &str) -> MedicationOutcome {
        let outcome = catalog.fetch_item(url).await;
        let partial = match &outcome {
            SourceOutcome::Found(partial) => partial.clone(),
            SourceOutcome::NoData(reason) => {
                let message = reason.to_string();
                warn!(url, reason = %message, "Catalog item skipped");
                return MedicationOutcome {
                    name: url.to_string(),
                    status: OutcomeStatus::Failed(message),
                    confidence: 0,
                    sources: Vec::new(),
                    source_outcomes: vec![(SourceId::DrugsComCatalog, outcome)],
                };
            }
        };

        let name = partial.name.clone();
        let consolidation = merge_with(std::slice::from_ref(&partial), &self.policy);
        let confidence = consolidation.confidence();
        let sources = consolidation.sources().to_vec();
        let status = match consolidation {
            Consolidation::Record(record) => match self.repo.upsert(&record).await {
                Ok(()) => OutcomeStatus::Persisted,
                Err(e) => {
                    error!(name = %name, error = %e, "Failed to persist catalog item");
                    OutcomeStatus::Failed(e.to_string())
                }
            },
            Consolidation::Insufficient { .. } => OutcomeStatus::Insufficient,
        };

        MedicationOutcome {
            name,
            status,
            confidence,
            sources,
            source_outcomes: vec![(SourceId::DrugsComCatalog, outcome)],
        }
    }

    fn emit(&self, summary: &RunSummary, index: usize, outcome: &MedicationOutcome) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(RunProgress {
                run_id: summary.run_id,
                index,
                total: summary.total,
                name: outcome.name.clone(),
                status: outcome.status.clone(),
                succeeded: summary.succeeded,
                failed: summary.failed,
            });
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
