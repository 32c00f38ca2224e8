//! Drug-safety source adapters.

pub mod drugs_com;
pub mod drugs_com_catalog;
pub mod e_lactancia;
pub mod fda_orange_book;

use std::sync::Arc;

use async_trait::async_trait;

use gravida_common::SourceId;

use crate::fetch::Fetcher;
use crate::models::{MedicationQuery, SourceOutcome};
use crate::pacing::PacingPolicy;

pub use drugs_com::DrugsComSource;
pub use drugs_com_catalog::CatalogSource;
pub use e_lactancia::ELactanciaSource;
pub use fda_orange_book::FdaOrangeBookSource;

/// Common interface for per-medication sources.
///
/// `resolve` never fails: fetch errors, missing links and unparseable pages
/// all come back as `SourceOutcome::NoData`.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn id(&self) -> SourceId;

    async fn resolve(&self, query: &MedicationQuery) -> SourceOutcome;
}

/// Build the per-medication adapter for `id`. The bulk catalog has none.
pub fn adapter_for(id: SourceId, fetcher: &Fetcher, pacing: &PacingPolicy) -> Option<Arc<dyn SourceAdapter>> {
    match id {
        SourceId::FdaOrangeBook => Some(Arc::new(FdaOrangeBookSource::new(fetcher.clone()))),
        SourceId::ELactancia => Some(Arc::new(ELactanciaSource::new(
            fetcher.clone(),
            pacing.between_languages,
        ))),
        SourceId::DrugsCom => Some(Arc::new(DrugsComSource::new(fetcher.clone()))),
        SourceId::DrugsComCatalog => None,
    }
}

/// Lower-cased name with spaces turned into dashes (`folic acid` -> `folic-acid`).
pub(crate) fn slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::fetch::{ConnectionLimiter, FetchPolicy, Fetcher, ScriptedTransport};

    /// Fetcher over `transport` with a single attempt and no waiting.
    pub fn quick_fetcher(transport: Arc<ScriptedTransport>) -> Fetcher {
        let policy = FetchPolicy {
            max_attempts: 1,
            backoff: vec![Duration::ZERO],
            jitter: Duration::ZERO,
            rate_limit_cooldown: Duration::ZERO,
        };
        Fetcher::new(transport, policy, ConnectionLimiter::new(5, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Folic  Acid"), "folic-acid");
        assert_eq!(slug("ibuprofeno"), "ibuprofeno");
    }
}
