//! FDA Orange Book registry query.
//!
//! A single parameterised GET; the result table is read by fixed column
//! position. Only a missing table (or one without data rows) means no data.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{info, instrument};
use url::Url;

use gravida_common::text::clean_field;
use gravida_common::{Language, SourceId};

use super::SourceAdapter;
use crate::extract::ExtractionProfile;
use crate::fetch::Fetcher;
use crate::html::{element_text, visible_text};
use crate::models::{MedicationQuery, NoDataReason, PartialRecord, RegistryEntry, SourceOutcome};

pub const FDA_BASE_URL: &str = "https://www.accessdata.fda.gov";
const SEARCH_PATH: &str = "/scripts/cder/ob/default.cfm";

/// Rows with fewer cells are layout filler.
const MIN_CELLS: usize = 6;
const COL_APPLICATION: usize = 0;
const COL_PRODUCT: usize = 1;
const COL_APPLICANT: usize = 2;
const COL_APPROVAL_DATE: usize = 4;
const MAX_CELL_CHARS: usize = 200;

pub struct FdaOrangeBookSource {
    fetcher: Fetcher,
    base_url: String,
}

impl FdaOrangeBookSource {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            base_url: FDA_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn query_url(&self, ingredient: &str) -> String {
        let base = format!("{}{SEARCH_PATH}", self.base_url);
        match Url::parse_with_params(
            &base,
            &[("Ingredient", ingredient), ("DrugName", ""), ("tableType", "OB")],
        ) {
            Ok(url) => url.to_string(),
            Err(_) => base,
        }
    }
}

/// First data row of `table.standardTable`, or `None` when the table is
/// missing or has no row with enough cells.
pub fn parse_registry(html: &str) -> Option<RegistryEntry> {
    let doc = Html::parse_document(html);
    let table = doc.select(table_selector()).next()?;

    table
        .select(row_selector())
        .skip(1)
        .map(|row| row.select(cell_selector()).map(element_text).collect::<Vec<_>>())
        .find(|cells| cells.len() >= MIN_CELLS)
        .map(|cells| {
            let cell = |idx: usize| clean_field(&cells[idx], MAX_CELL_CHARS);
            RegistryEntry {
                application_number: cell(COL_APPLICATION),
                product_name: cell(COL_PRODUCT),
                applicant: cell(COL_APPLICANT),
                approval_date: cell(COL_APPROVAL_DATE),
            }
        })
}

fn table_selector() -> &'static Selector {
    use std::sync::OnceLock;
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("table.standardTable").expect("valid table selector"))
}

fn row_selector() -> &'static Selector {
    use std::sync::OnceLock;
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("tr").expect("valid row selector"))
}

fn cell_selector() -> &'static Selector {
    use std::sync::OnceLock;
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("td").expect("valid cell selector"))
}

#[async_trait]
impl SourceAdapter for FdaOrangeBookSource {
    fn id(&self) -> SourceId {
        SourceId::FdaOrangeBook
    }

    #[instrument(skip(self, query), fields(name = %query.name))]
    async fn resolve(&self, query: &MedicationQuery) -> SourceOutcome {
        let url = self.query_url(&query.name);
        let fetched = self.fetcher.get(&url).await;
        let status = fetched.status;
        let final_url = fetched.url.clone();
        let Some(html) = fetched.into_body() else {
            return SourceOutcome::NoData(NoDataReason::FetchFailed(status.to_string()));
        };

        let Some(entry) = parse_registry(&html) else {
            info!("Orange Book result table missing or empty");
            return SourceOutcome::NoData(NoDataReason::MissingStructure);
        };

        let mut partial = PartialRecord::new(&query.name, SourceId::FdaOrangeBook);
        ExtractionProfile::REGISTRY.apply(&visible_text(&html)).apply_to(&mut partial);
        if !entry.is_empty() {
            partial.registry = Some(entry);
        }
        partial.source_url = Some(final_url);
        partial.language = Some(Language::English);
        partial.into_outcome()
    }
}
