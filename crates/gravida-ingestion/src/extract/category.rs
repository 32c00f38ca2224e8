//! Letter risk-category extractor.

use gravida_common::RiskCategory;

use super::patterns::category_regexes;

/// First letter captured by the ordered category patterns, if any.
pub fn extract_risk_category(text: &str) -> Option<RiskCategory> {
    category_regexes().iter().find_map(|re| {
        re.captures(text)
            .and_then(|cap| cap.get(1))
            .and_then(|m| m.as_str().chars().next())
            .and_then(|c| RiskCategory::from_letter(c.to_ascii_uppercase()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_then_value() {
        assert_eq!(
            extract_risk_category("FDA pregnancy category: C (prior to 30 weeks)"),
            Some(RiskCategory::C)
        );
        assert_eq!(extract_risk_category("Pregnancy Category X"), Some(RiskCategory::X));
    }

    #[test]
    fn test_colon_after_label() {
        assert_eq!(extract_risk_category("Pregnancy Category: C"), Some(RiskCategory::C));
        assert_eq!(extract_risk_category("pregnancy category:X"), Some(RiskCategory::X));
    }

    #[test]
    fn test_value_then_label() {
        assert_eq!(
            extract_risk_category("Listed as category D, pregnancy use restricted."),
            Some(RiskCategory::D)
        );
    }

    #[test]
    fn test_lowercase_letter_is_uppercased() {
        assert_eq!(extract_risk_category("pregnancy category b"), Some(RiskCategory::B));
    }

    #[test]
    fn test_first_pattern_wins() {
        let text = "Category A pregnancy note. FDA pregnancy category D applies.";
        assert_eq!(extract_risk_category(text), Some(RiskCategory::D));
    }

    #[test]
    fn test_word_after_label_is_not_a_letter() {
        assert_eq!(extract_risk_category("pregnancy category and lactation"), None);
    }

    #[test]
    fn test_letters_outside_range_ignored() {
        assert_eq!(extract_risk_category("pregnancy category E"), None);
        assert_eq!(extract_risk_category(""), None);
    }
}
