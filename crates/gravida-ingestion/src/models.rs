//! Shared data models for the ingestion pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gravida_common::text::normalize_name;
use gravida_common::{Language, RiskCategory, RiskLevel, SourceId, TrimesterSafety};

/// One medication to look up. Names are normalised on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationQuery {
    pub name: String,
    /// Alternate-language (Spanish) name, when it differs from `name`.
    pub alternate: Option<String>,
    /// Sources to try, in priority order.
    pub sources: Vec<SourceId>,
}

impl MedicationQuery {
    pub fn new(name: &str, alternate: Option<&str>) -> Self {
        let name = normalize_name(name);
        let alternate = alternate
            .map(normalize_name)
            .filter(|alt| !alt.is_empty() && *alt != name);
        Self {
            name,
            alternate,
            sources: SourceId::default_priority(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<SourceId>) -> Self {
        self.sources = sources;
        self
    }
}

/// Official registry row (FDA Orange Book).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub application_number: Option<String>,
    pub product_name: Option<String>,
    pub applicant: Option<String>,
    pub approval_date: Option<String>,
}

impl RegistryEntry {
    pub fn is_empty(&self) -> bool {
        self.application_number.is_none()
            && self.product_name.is_none()
            && self.applicant.is_none()
            && self.approval_date.is_none()
    }

    /// Human-readable one-liner stored in `observations`.
    pub fn summary(&self) -> Option<String> {
        let parts: Vec<String> = [
            ("application", &self.application_number),
            ("product", &self.product_name),
            ("applicant", &self.applicant),
            ("approved", &self.approval_date),
        ]
        .iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label} {v}")))
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(format!("{}: {}", SourceId::FdaOrangeBook.display_name(), parts.join("; ")))
        }
    }
}

/// One source's contribution for one medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialRecord {
    pub name: String,
    pub source: SourceId,
    pub risk_category: Option<RiskCategory>,
    pub risk_level: Option<RiskLevel>,
    pub notes: Option<String>,
    pub trimester_safety: Option<TrimesterSafety>,
    pub recommendations: Option<String>,
    pub registry: Option<RegistryEntry>,
    pub source_url: Option<String>,
    pub language: Option<Language>,
    pub extracted_at: DateTime<Utc>,
}

impl PartialRecord {
    pub fn new(name: &str, source: SourceId) -> Self {
        Self {
            name: normalize_name(name),
            source,
            risk_category: None,
            risk_level: None,
            notes: None,
            trimester_safety: None,
            recommendations: None,
            registry: None,
            source_url: None,
            language: None,
            extracted_at: Utc::now(),
        }
    }

    /// Fixed confidence weight of the producing source.
    pub fn weight(&self) -> u32 {
        self.source.weight()
    }

    /// True when at least one data field carries a value.
    pub fn has_data(&self) -> bool {
        self.risk_category.is_some()
            || self.risk_level.is_some()
            || self.notes.is_some()
            || self.trimester_safety.is_some_and(|t| !t.is_empty())
            || self.recommendations.is_some()
            || self.registry.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// Enforce the "some data or no data" rule.
    pub fn into_outcome(self) -> SourceOutcome {
        if self.has_data() {
            SourceOutcome::Found(self)
        } else {
            SourceOutcome::NoData(NoDataReason::NothingExtracted)
        }
    }
}

/// Why a source produced nothing for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDataReason {
    /// A fetch ended without a 200.
    FetchFailed(String),
    /// Search page carried no candidate detail links.
    NoCandidates,
    /// The page did not look like medical content about the subject.
    InvalidPage,
    /// The expected table or element was missing.
    MissingStructure,
    /// Page parsed but every extractor came back empty.
    NothingExtracted,
    /// Source not applicable to per-medication lookups.
    Unsupported,
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::FetchFailed(status) => write!(f, "fetch failed ({status})"),
            NoDataReason::NoCandidates => write!(f, "no candidate links"),
            NoDataReason::InvalidPage => write!(f, "page failed validity check"),
            NoDataReason::MissingStructure => write!(f, "expected structure missing"),
            NoDataReason::NothingExtracted => write!(f, "nothing extracted"),
            NoDataReason::Unsupported => write!(f, "not a per-medication source"),
        }
    }
}

/// Result of resolving one source for one medication.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Found(PartialRecord),
    NoData(NoDataReason),
}

impl SourceOutcome {
    pub fn partial(&self) -> Option<&PartialRecord> {
        match self {
            SourceOutcome::Found(p) => Some(p),
            SourceOutcome::NoData(_) => None,
        }
    }

    pub fn into_partial(self) -> Option<PartialRecord> {
        match self {
            SourceOutcome::Found(p) => Some(p),
            SourceOutcome::NoData(_) => None,
        }
    }
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOutcome::Found(_) => write!(f, "found"),
            SourceOutcome::NoData(reason) => write!(f, "no data: {reason}"),
        }
    }
}
