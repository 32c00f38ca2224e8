//! drugs.com pregnancy catalog, crawled in bulk.
//!
//! Three levels: the index lists letter pages, each letter page lists item
//! pages, each item page describes one medication. Items are fetched one by
//! one with a small fixed delay so the caller can persist as it goes.

use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use gravida_common::text::{clean_field, normalize_name};
use gravida_common::{Language, RiskCategory, SourceId};

use super::drugs_com::DRUGS_COM_BASE_URL;
use crate::extract::{extract_risk_category, extract_trimester_safety};
use crate::fetch::Fetcher;
use crate::html::{element_text, select_links, visible_text};
use crate::models::{NoDataReason, PartialRecord, SourceOutcome};

const INDEX_PATH: &str = "/pregnancy.html";
const CATEGORY_LABEL: &str = "fda pregnancy category";
const MAX_NOTES_CHARS: usize = 400;

/// Title suffixes stripped to recover the medication name.
const TITLE_SUFFIXES: &[&str] = &[
    " pregnancy and breastfeeding warnings",
    " pregnancy warnings",
    " use during pregnancy",
];

pub struct CatalogSource {
    fetcher: Fetcher,
    item_delay: Duration,
    base_url: String,
}

impl CatalogSource {
    pub fn new(fetcher: Fetcher, item_delay: Duration) -> Self {
        Self {
            fetcher,
            item_delay,
            base_url: DRUGS_COM_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn index_url(&self) -> String {
        format!("{}{INDEX_PATH}", self.base_url)
    }

    pub fn item_delay(&self) -> Duration {
        self.item_delay
    }

    /// Walk index and letter pages, returning item URLs in catalog order,
    /// at most `limit` of them.
    #[instrument(skip(self))]
    pub async fn item_urls(&self, limit: Option<usize>) -> Vec<String> {
        let index_url = self.index_url();
        let Some(index_html) = self.fetcher.get(&index_url).await.into_body() else {
            warn!(url = %index_url, "Catalog index unavailable");
            return Vec::new();
        };
        let letters = page_links(&index_html, &index_url, letter_selector());
        info!(letters = letters.len(), "Catalog letter pages found");

        let mut items: Vec<String> = Vec::new();
        for letter_url in letters {
            if limit.is_some_and(|max| items.len() >= max) {
                break;
            }
            tokio::time::sleep(self.item_delay).await;
            let Some(letter_html) = self.fetcher.get(&letter_url).await.into_body() else {
                warn!(url = %letter_url, "Catalog letter page unavailable");
                continue;
            };
            for link in page_links(&letter_html, &letter_url, item_selector()) {
                if !items.contains(&link) {
                    items.push(link);
                }
            }
            debug!(url = %letter_url, total = items.len(), "Catalog letter page read");
        }

        if let Some(max) = limit {
            items.truncate(max);
        }
        items
    }

    /// Fetch and parse one item page.
    pub async fn fetch_item(&self, url: &str) -> SourceOutcome {
        let fetched = self.fetcher.get(url).await;
        let status = fetched.status;
        let final_url = fetched.url.clone();
        let Some(html) = fetched.into_body() else {
            return SourceOutcome::NoData(NoDataReason::FetchFailed(status.to_string()));
        };
        match parse_item(&html) {
            Some(mut partial) => {
                partial.source_url = Some(final_url);
                partial.into_outcome()
            }
            None => SourceOutcome::NoData(NoDataReason::MissingStructure),
        }
    }
}

fn page_links(html: &str, page_url: &str, selector: &Selector) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    select_links(&doc, selector, &base, |_| true)
}

/// Parse an item page. `None` when the page has no title.
pub fn parse_item(html: &str) -> Option<PartialRecord> {
    let doc = Html::parse_document(html);
    let title = doc.select(title_selector()).next().map(element_text)?;
    let name = medication_name(&title)?;

    let notes = doc
        .select(notes_selector())
        .next()
        .map(element_text)
        .and_then(|text| clean_field(&text, MAX_NOTES_CHARS));

    let text = visible_text(html);
    let risk_category = labelled_category(&doc).or_else(|| extract_risk_category(&text));

    let mut partial = PartialRecord::new(&name, SourceId::DrugsComCatalog);
    partial.risk_category = risk_category;
    partial.trimester_safety = extract_trimester_safety(&text);
    partial.notes = notes;
    partial.language = Some(Language::English);
    Some(partial)
}

/// Category from the text right after a `<strong>FDA pregnancy category</strong>` label.
fn labelled_category(doc: &Html) -> Option<RiskCategory> {
    doc.select(strong_selector())
        .filter(|label| element_text(*label).to_lowercase().contains(CATEGORY_LABEL))
        .find_map(category_after)
}

fn category_after(label: ElementRef<'_>) -> Option<RiskCategory> {
    let sibling = label.next_sibling()?;
    let text = match sibling.value().as_text() {
        Some(text) => (&**text).to_owned(),
        None => ElementRef::wrap(sibling).map(element_text)?,
    };
    let token = text
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_ascii_alphanumeric());
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => RiskCategory::from_letter(letter.to_ascii_uppercase()),
        _ => None,
    }
}

fn medication_name(title: &str) -> Option<String> {
    let mut name = normalize_name(title);
    for suffix in TITLE_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.trim().to_string();
            break;
        }
    }
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

macro_rules! cached_selector {
    ($fn_name:ident, $css:expr) => {
        fn $fn_name() -> &'static Selector {
            use std::sync::OnceLock;
            static SEL: OnceLock<Selector> = OnceLock::new();
            SEL.get_or_init(|| Selector::parse($css).expect("valid catalog selector"))
        }
    };
}

cached_selector!(letter_selector, ".ddc-paging li a[href]");
cached_selector!(item_selector, "ul.column-list li a[href]");
cached_selector!(title_selector, "h1");
cached_selector!(notes_selector, "div.contentBox p");
cached_selector!(strong_selector, "strong");
