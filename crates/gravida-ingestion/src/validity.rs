//! Validity classifier: does a page plausibly carry medical content about
//! the queried medication?
//!
//! Pure and total. A page is valid iff the subject is mentioned at least
//! once and at least three distinct domain keywords appear.

use serde::Serialize;

use gravida_common::text::count_occurrences_ci;

/// Bilingual medical/pregnancy vocabulary, matched as lower-case substrings.
pub const MEDICAL_KEYWORDS: &[&str] = &[
    "pregnancy",
    "embarazo",
    "pregnant",
    "embarazada",
    "fetal",
    "maternal",
    "risk",
    "riesgo",
    "compatible",
    "contraindicated",
    "contraindicado",
    "trimester",
    "trimestre",
    "gestation",
    "gestacion",
    "teratogenic",
];

pub const MIN_SUBJECT_MENTIONS: usize = 1;
pub const MIN_KEYWORD_MATCHES: usize = 3;

/// Scores behind a validity decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidityAssessment {
    pub subject_mentions: usize,
    pub keyword_matches: usize,
}

impl ValidityAssessment {
    pub fn is_valid(&self) -> bool {
        self.subject_mentions >= MIN_SUBJECT_MENTIONS && self.keyword_matches >= MIN_KEYWORD_MATCHES
    }
}

pub fn assess(document_text: &str, subject_name: &str) -> ValidityAssessment {
    let lower = document_text.to_lowercase();
    ValidityAssessment {
        subject_mentions: count_occurrences_ci(document_text, subject_name),
        keyword_matches: MEDICAL_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count(),
    }
}

pub fn is_valid(document_text: &str, subject_name: &str) -> bool {
    assess(document_text, subject_name).is_valid()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_page() {
        let text = "Ibuprofen and pregnancy: avoid in the third trimester; risk of fetal harm.";
        let a = assess(text, "ibuprofen");
        assert_eq!(a.subject_mentions, 1);
        assert!(a.keyword_matches >= 3);
        assert!(a.is_valid());
    }

    #[test]
    fn test_no_keywords_never_valid() {
        let text = "ibuprofen ibuprofen ibuprofen ibuprofen buy now";
        assert!(!is_valid(text, "ibuprofen"));
        assert_eq!(assess(text, "ibuprofen").keyword_matches, 0);
    }

    #[test]
    fn test_missing_subject_is_invalid() {
        let text = "pregnancy risk trimester fetal maternal";
        assert!(!is_valid(text, "metformin"));
    }

    #[test]
    fn test_two_keywords_is_not_enough() {
        assert!(!is_valid("Aspirin pregnancy warning: fetal", "aspirin"));
        assert!(is_valid("Aspirin pregnancy warning: fetal maternal", "aspirin"));
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        let text = "aspirin pregnancy pregnancy pregnancy";
        assert_eq!(assess(text, "aspirin").keyword_matches, 1);
    }

    #[test]
    fn test_spanish_vocabulary() {
        assert!(is_valid("Ibuprofeno: riesgo bajo durante el embarazo, tercer trimestre", "ibuprofeno"));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(!is_valid("", ""));
        assert!(!is_valid("pregnancy risk fetal", ""));
    }
}
