//! e-lactancia.org dual-language direct lookup.
//!
//! Detail URLs are predictable from the name, so there is no search step.
//! The canonical (English) name is tried first and the Spanish alternate
//! second, one after the other with a politeness delay in between. When both
//! pages yield data the Spanish one wins.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use gravida_common::{Language, SourceId};

use super::{slug, SourceAdapter};
use crate::extract::ExtractionProfile;
use crate::fetch::Fetcher;
use crate::html::visible_text;
use crate::models::{MedicationQuery, NoDataReason, PartialRecord, SourceOutcome};
use crate::pacing::DelayRange;
use crate::validity;

pub const E_LACTANCIA_BASE_URL: &str = "https://www.e-lactancia.org";

pub struct ELactanciaSource {
    fetcher: Fetcher,
    between_languages: DelayRange,
    base_url: String,
}

impl ELactanciaSource {
    pub fn new(fetcher: Fetcher, between_languages: DelayRange) -> Self {
        Self {
            fetcher,
            between_languages,
            base_url: E_LACTANCIA_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn product_url(&self, name: &str) -> String {
        format!("{}/breastfeeding/{}/product/", self.base_url, slug(name))
    }

    /// Fetch, validate and extract one language variant.
    async fn lookup(&self, query: &MedicationQuery, name: &str, language: Language) -> SourceOutcome {
        let url = self.product_url(name);
        let fetched = self.fetcher.get_spanish(&url).await;
        let status = fetched.status;
        let final_url = fetched.url.clone();
        let Some(html) = fetched.into_body() else {
            info!(name, language = language.as_str(), status = %status, "No e-lactancia page");
            return SourceOutcome::NoData(NoDataReason::FetchFailed(status.to_string()));
        };

        let text = visible_text(&html);
        if !validity::is_valid(&text, name) {
            info!(name, language = language.as_str(), "e-lactancia page failed validity check");
            return SourceOutcome::NoData(NoDataReason::InvalidPage);
        }

        let mut partial = PartialRecord::new(&query.name, SourceId::ELactancia);
        ExtractionProfile::NARRATIVE.apply(&text).apply_to(&mut partial);
        partial.source_url = Some(final_url);
        partial.language = Some(language);
        debug!(name, language = language.as_str(), has_data = partial.has_data(), "e-lactancia page extracted");
        partial.into_outcome()
    }
}

#[async_trait]
impl SourceAdapter for ELactanciaSource {
    fn id(&self) -> SourceId {
        SourceId::ELactancia
    }

    #[instrument(skip(self, query), fields(name = %query.name))]
    async fn resolve(&self, query: &MedicationQuery) -> SourceOutcome {
        let english = self.lookup(query, &query.name, Language::English).await;

        let Some(alternate) = query.alternate.as_deref() else {
            return english;
        };

        self.between_languages.wait("between languages").await;
        let spanish = self.lookup(query, alternate, Language::Spanish).await;

        match (spanish, english) {
            (found @ SourceOutcome::Found(_), _) => found,
            (_, found @ SourceOutcome::Found(_)) => found,
            (spanish_miss, _) => spanish_miss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ScriptedTransport;
    use crate::sources::test_support::quick_fetcher;
    use gravida_common::RiskLevel;
    use std::sync::Arc;

    const EN_URL: &str = "https://www.e-lactancia.org/breastfeeding/ibuprofen/product/";
    const ES_URL: &str = "https://www.e-lactancia.org/breastfeeding/ibuprofeno/product/";

    fn page(name: &str, level: &str) -> String {
        format!(
            "<html><body><h1>{name}</h1><div>{level}</div>\
             <p>{name} during pregnancy: data from many exposed pregnancies show no increase in malformations overall here.</p>\
             <p>Maternal risk and trimester notes.</p></body></html>"
        )
    }

    fn source(transport: Arc<ScriptedTransport>) -> ELactanciaSource {
        ELactanciaSource::new(quick_fetcher(transport), DelayRange::ZERO)
    }

    #[tokio::test]
    async fn test_spanish_result_preferred() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(EN_URL, 200, &page("ibuprofen", "Low Risk"));
        transport.respond(ES_URL, 200, &page("ibuprofeno", "Riesgo muy bajo"));

        let query = MedicationQuery::new("ibuprofen", Some("ibuprofeno"));
        let partial = source(transport.clone()).resolve(&query).await.into_partial().unwrap();

        assert_eq!(partial.name, "ibuprofen");
        assert_eq!(partial.language, Some(Language::Spanish));
        assert_eq!(partial.risk_level, Some(RiskLevel::VeryLow));
        assert_eq!(partial.source_url.as_deref(), Some(ES_URL));

        let calls: Vec<String> = transport.calls().into_iter().map(|c| c.url).collect();
        assert_eq!(calls, vec![EN_URL.to_string(), ES_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_falls_back_to_english() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(EN_URL, 200, &page("ibuprofen", "Low Risk"));
        transport.respond(ES_URL, 404, "");

        let query = MedicationQuery::new("ibuprofen", Some("ibuprofeno"));
        let partial = source(transport).resolve(&query).await.into_partial().unwrap();
        assert_eq!(partial.language, Some(Language::English));
        assert_eq!(partial.risk_level, Some(RiskLevel::Low));
    }

    #[tokio::test]
    async fn test_neither_valid_is_no_data() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(EN_URL, 200, "<html>ibuprofen</html>");

        let query = MedicationQuery::new("ibuprofen", Some("ibuprofeno"));
        let outcome = source(transport).resolve(&query).await;
        assert_eq!(
            outcome,
            SourceOutcome::NoData(NoDataReason::FetchFailed("not-found".into()))
        );
    }

    #[tokio::test]
    async fn test_requests_prefer_spanish() {
        let transport = Arc::new(ScriptedTransport::new());
        let query = MedicationQuery::new("aspirin", None);
        let _ = source(transport.clone()).resolve(&query).await;
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].accept_language.starts_with("es-"));
    }

    #[test]
    fn test_product_url_slug() {
        let transport = Arc::new(ScriptedTransport::new());
        assert_eq!(
            source(transport).product_url("Folic Acid"),
            "https://www.e-lactancia.org/breastfeeding/folic-acid/product/"
        );
    }
}
