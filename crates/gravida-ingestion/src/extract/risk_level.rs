//! Narrative severity label extractor.

use gravida_common::text::contains_phrase;
use gravida_common::RiskLevel;

use super::patterns::RISK_LEVEL_PHRASES;

pub fn extract_risk_level(text: &str) -> Option<RiskLevel> {
    let lower = text.to_lowercase();
    RISK_LEVEL_PHRASES
        .iter()
        .find(|(phrase, _)| contains_phrase(&lower, phrase))
        .map(|(_, level)| *level)
}
