//! drugs.com search-then-detail adapter.
//!
//! Search page -> first `/mtm/` or `/monograph/` link -> detail page ->
//! validity check -> monograph extractors.

use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, info, instrument};
use url::Url;

use gravida_common::{Language, SourceId};

use super::SourceAdapter;
use crate::extract::ExtractionProfile;
use crate::fetch::Fetcher;
use crate::html::{extract_links, visible_text};
use crate::models::{MedicationQuery, NoDataReason, PartialRecord, SourceOutcome};
use crate::validity;

pub const DRUGS_COM_BASE_URL: &str = "https://www.drugs.com";

/// Path markers identifying monograph detail pages.
const DETAIL_MARKERS: &[&str] = &["/mtm/", "/monograph/"];

pub struct DrugsComSource {
    fetcher: Fetcher,
    base_url: String,
}

impl DrugsComSource {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            base_url: DRUGS_COM_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn search_url(&self, name: &str) -> String {
        let term: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
        format!("{}/search.php?searchterm={term}", self.base_url)
    }
}

/// Detail-page candidates on a search results page, in document order.
pub fn candidate_links(search_html: &str, search_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(search_url) else {
        return Vec::new();
    };
    let doc = Html::parse_document(search_html);
    extract_links(&doc, &base, |href| DETAIL_MARKERS.iter().any(|m| href.contains(m)))
}

#[async_trait]
impl SourceAdapter for DrugsComSource {
    fn id(&self) -> SourceId {
        SourceId::DrugsCom
    }

    #[instrument(skip(self, query), fields(name = %query.name))]
    async fn resolve(&self, query: &MedicationQuery) -> SourceOutcome {
        let search_url = self.search_url(&query.name);
        let search = self.fetcher.get(&search_url).await;
        let status = search.status;
        let Some(search_html) = search.into_body() else {
            return SourceOutcome::NoData(NoDataReason::FetchFailed(status.to_string()));
        };

        let candidates = candidate_links(&search_html, &search_url);
        let Some(detail_url) = candidates.into_iter().next() else {
            info!("No detail links on drugs.com search page");
            return SourceOutcome::NoData(NoDataReason::NoCandidates);
        };
        debug!(detail_url = %detail_url, "Following first candidate");

        let detail = self.fetcher.get(&detail_url).await;
        let status = detail.status;
        let final_url = detail.url.clone();
        let Some(detail_html) = detail.into_body() else {
            return SourceOutcome::NoData(NoDataReason::FetchFailed(status.to_string()));
        };

        let text = visible_text(&detail_html);
        if !validity::is_valid(&text, &query.name) {
            info!(url = %final_url, "Detail page failed validity check");
            return SourceOutcome::NoData(NoDataReason::InvalidPage);
        }

        let mut partial = PartialRecord::new(&query.name, SourceId::DrugsCom);
        ExtractionProfile::MONOGRAPH.apply(&text).apply_to(&mut partial);
        partial.source_url = Some(final_url);
        partial.language = Some(Language::English);
        partial.into_outcome()
    }
}
