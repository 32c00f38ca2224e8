//! Recommendation/alternative sentence extractor.

use gravida_common::text::{normalize_whitespace, truncate_chars};

use super::notes::split_sentences;
use super::patterns::{mentions_any, RECOMMENDATION_KEYWORDS};

const MIN_CHARS: usize = 80;
const MAX_CHARS: usize = 250;
const MAX_SENTENCES: usize = 2;
const DELIMITER: &str = " | ";

pub fn extract_recommendations(text: &str) -> Option<String> {
    let mut picked: Vec<String> = Vec::new();
    for sentence in split_sentences(text) {
        let cleaned = normalize_whitespace(sentence);
        if cleaned.chars().count() <= MIN_CHARS {
            continue;
        }
        if !mentions_any(&cleaned.to_lowercase(), RECOMMENDATION_KEYWORDS) {
            continue;
        }
        let capped = truncate_chars(&cleaned, MAX_CHARS);
        if !picked.contains(&capped) {
            picked.push(capped);
        }
        if picked.len() == MAX_SENTENCES {
            break;
        }
    }

    if picked.is_empty() {
        None
    } else {
        Some(picked.join(DELIMITER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_first_two_long_sentences() {
        let text = "Short avoid. \
            Paracetamol is the recommended alternative analgesic during pregnancy for mild to moderate pain relief. \
            Avoid use after twenty weeks of gestation because of the risk of oligohydramnios in the fetus. \
            Use caution with high doses over a long period in women trying to conceive or in early pregnancy.";
        let recs = extract_recommendations(text).unwrap();
        let parts: Vec<&str> = recs.split(" | ").collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("Paracetamol is the recommended"));
        assert!(parts[1].starts_with("Avoid use after"));
    }

    #[test]
    fn test_decimal_dose_stays_in_one_sentence() {
        let text = "Avoid doses above 2.5 mg per day in the third trimester because higher exposure is linked to ductus closure in the fetus.";
        assert_eq!(extract_recommendations(text).as_deref(), Some(text));
    }

    #[test]
    fn test_sentence_without_keyword_skipped() {
        let text = "This is a long descriptive sentence about the chemical structure of the molecule and its synthesis route.";
        assert_eq!(extract_recommendations(text), None);
    }

    #[test]
    fn test_cap() {
        let text = format!("We recommend {}", "x ".repeat(300));
        let recs = extract_recommendations(&text).unwrap();
        assert_eq!(recs.chars().count(), 250);
    }
}
