//! Configuration loading for Gravida.
//! Reads gravida.toml from the current directory or path in GRAVIDA_CONFIG env var.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use gravida_common::SourceId;
use gravida_ingestion::{ConsolidationPolicy, DelayRange, FetchPolicy, MedicationQuery, PacingPolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub consolidation: ConsolidationConfig,
    #[serde(default)]
    pub medications: Vec<MedicationEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

fn default_db_path() -> String { "db/medicamentos.db".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: Vec<u64>,
    #[serde(default = "default_jitter_secs")]
    pub jitter_secs: f64,
    #[serde(default = "default_cooldown_secs")]
    pub rate_limit_cooldown_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_max_connections_per_host")]
    pub max_connections_per_host: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
            jitter_secs: default_jitter_secs(),
            rate_limit_cooldown_secs: default_cooldown_secs(),
            timeout_secs: default_timeout_secs(),
            max_connections: default_max_connections(),
            max_connections_per_host: default_max_connections_per_host(),
        }
    }
}

fn default_max_attempts()             -> u32      { 3 }
fn default_backoff_secs()             -> Vec<u64> { vec![3, 8, 15] }
fn default_jitter_secs()              -> f64      { 5.0 }
fn default_cooldown_secs()            -> u64      { 60 }
fn default_timeout_secs()             -> u64      { 45 }
fn default_max_connections()          -> usize    { 5 }
fn default_max_connections_per_host() -> usize    { 1 }

impl FetchConfig {
    pub fn policy(&self) -> FetchPolicy {
        FetchPolicy {
            max_attempts: self.max_attempts,
            backoff: self.backoff_secs.iter().copied().map(Duration::from_secs).collect(),
            jitter: Duration::try_from_secs_f64(self.jitter_secs).unwrap_or(Duration::ZERO),
            rate_limit_cooldown: Duration::from_secs(self.rate_limit_cooldown_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Delay ranges are `[min, max]` pairs in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_between_medications")]
    pub between_medications_secs: [u64; 2],
    #[serde(default = "default_between_sources")]
    pub between_sources_secs: [u64; 2],
    #[serde(default = "default_between_languages")]
    pub between_languages_secs: [u64; 2],
    #[serde(default = "default_catalog_item_delay_ms")]
    pub catalog_item_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            between_medications_secs: default_between_medications(),
            between_sources_secs: default_between_sources(),
            between_languages_secs: default_between_languages(),
            catalog_item_delay_ms: default_catalog_item_delay_ms(),
        }
    }
}

fn default_between_medications()  -> [u64; 2] { [8, 18] }
fn default_between_sources()      -> [u64; 2] { [2, 5] }
fn default_between_languages()    -> [u64; 2] { [3, 6] }
fn default_catalog_item_delay_ms() -> u64     { 300 }

impl PacingConfig {
    pub fn policy(&self) -> PacingPolicy {
        let range = |[min, max]: [u64; 2]| DelayRange::from_secs(min, max);
        PacingPolicy {
            between_medications: range(self.between_medications_secs),
            between_sources: range(self.between_sources_secs),
            between_languages: range(self.between_languages_secs),
            catalog_item_delay: Duration::from_millis(self.catalog_item_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_sources")]
    pub enabled: Vec<SourceId>,
    #[serde(default = "default_sources")]
    pub priority: Vec<SourceId>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: default_sources(),
            priority: default_sources(),
        }
    }
}

fn default_sources() -> Vec<SourceId> { SourceId::default_priority() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationConfig {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: u32,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self { min_confidence: default_min_confidence() }
    }
}

fn default_min_confidence() -> u32 { 1 }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub name: String,
    /// Spanish name, tried second on bilingual sources.
    #[serde(default)]
    pub alternate: Option<String>,
}

/// Built-in list, English name paired with its Spanish variant.
pub const DEFAULT_MEDICATIONS: &[(&str, &str)] = &[
    // analgesics
    ("acetaminophen", "paracetamol"),
    ("ibuprofen", "ibuprofeno"),
    ("aspirin", "aspirina"),
    ("naproxen", "naproxeno"),
    ("diclofenac", "diclofenaco"),
    ("tramadol", "tramadol"),
    ("codeine", "codeina"),
    ("morphine", "morfina"),
    // antibiotics
    ("amoxicillin", "amoxicilina"),
    ("penicillin", "penicilina"),
    ("azithromycin", "azitromicina"),
    ("erythromycin", "eritromicina"),
    ("ciprofloxacin", "ciprofloxacina"),
    ("doxycycline", "doxiciclina"),
    ("metronidazole", "metronidazol"),
    ("clindamycin", "clindamicina"),
    // cardiovascular
    ("metoprolol", "metoprolol"),
    ("propranolol", "propranolol"),
    ("amlodipine", "amlodipina"),
    ("lisinopril", "lisinopril"),
    ("hydrochlorothiazide", "hidroclorotiazida"),
    ("furosemide", "furosemida"),
    ("warfarin", "warfarina"),
    ("heparin", "heparina"),
    // diabetes and endocrine
    ("insulin", "insulina"),
    ("metformin", "metformina"),
    ("levothyroxine", "levotiroxina"),
    ("prednisone", "prednisona"),
    ("prednisolone", "prednisolona"),
    ("hydrocortisone", "hidrocortisona"),
    // gastrointestinal
    ("omeprazole", "omeprazol"),
    ("ranitidine", "ranitidina"),
    ("famotidine", "famotidina"),
    ("ondansetron", "ondansetron"),
    ("metoclopramide", "metoclopramida"),
    // psychiatric
    ("sertraline", "sertralina"),
    ("fluoxetine", "fluoxetina"),
    ("paroxetine", "paroxetina"),
    ("citalopram", "citalopram"),
    ("lorazepam", "lorazepam"),
    ("diazepam", "diazepam"),
    // antihistamines
    ("diphenhydramine", "difenhidramina"),
    ("loratadine", "loratadina"),
    ("cetirizine", "cetirizina"),
    // other
    ("folic acid", "acido folico"),
    ("iron", "hierro"),
    ("progesterone", "progesterona"),
    ("misoprostol", "misoprostol"),
];


impl Config {
    /// Load configuration from gravida.toml.
    /// Checks GRAVIDA_CONFIG env var first, then current directory.
    /// A missing file yields the built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("GRAVIDA_CONFIG")
            .unwrap_or_else(|_| "gravida.toml".to_string());

        if !Path::new(&path).exists() {
            tracing::warn!(
                "Config file not found: {path}; using built-in defaults. \
                 Copy gravida.example.toml to gravida.toml to customise."
            );
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.sources.enabled.is_empty() {
            anyhow::bail!("sources.enabled must name at least one source");
        }
        Ok(config)
    }

    pub fn consolidation_policy(&self) -> ConsolidationPolicy {
        ConsolidationPolicy {
            priority: self.sources.priority.clone(),
            min_confidence: self.consolidation.min_confidence,
        }
    }

    /// One query per configured medication (or the built-in list), each
    /// trying `sources` in the given order.
    pub fn queries(&self, sources: &[SourceId]) -> Vec<MedicationQuery> {
        let query = |name: &str, alternate: Option<&str>| {
            MedicationQuery::new(name, alternate).with_sources(sources.to_vec())
        };
        if self.medications.is_empty() {
            DEFAULT_MEDICATIONS
                .iter()
                .map(|(name, alternate)| query(name, Some(alternate)))
                .collect()
        } else {
            self.medications
                .iter()
                .map(|m| query(&m.name, m.alternate.as_deref()))
                .collect()
        }
    }
}
