//! Ordered pattern tables driving the extractors.
//!
//! Order is priority: every extractor walks its table top to bottom and the
//! first hit wins. Extend a table by inserting at the right rank.

use std::sync::OnceLock;

use regex::Regex;

use gravida_common::{RiskLevel, Trimester};

/// Risk-category patterns. Group 1 captures the letter.
pub const CATEGORY_PATTERNS: &[&str] = &[
    r"(?i)FDA\W*pregnancy\W*category\W*([ABCDX])\b",
    r"(?i)pregnancy\W*category\W*([ABCDX])\b",
    r"(?i)\bcategory\W*([ABCDX])\W*pregnancy",
];

/// Literal severity phrases, specific before general, English then Spanish
/// at each rank. Matched on word boundaries against lower-cased text.
pub const RISK_LEVEL_PHRASES: &[(&str, RiskLevel)] = &[
    ("very low risk", RiskLevel::VeryLow),
    ("riesgo muy bajo", RiskLevel::VeryLow),
    ("very high risk", RiskLevel::VeryHigh),
    ("riesgo muy alto", RiskLevel::VeryHigh),
    ("low risk", RiskLevel::Low),
    ("riesgo bajo", RiskLevel::Low),
    ("moderate risk", RiskLevel::Moderate),
    ("riesgo moderado", RiskLevel::Moderate),
    ("high risk", RiskLevel::High),
    ("riesgo alto", RiskLevel::High),
    ("probably compatible", RiskLevel::ProbablyCompatible),
    ("probablemente compatible", RiskLevel::ProbablyCompatible),
    ("compatible", RiskLevel::Compatible),
    ("use with caution", RiskLevel::UseWithCaution),
    ("usar con precaución", RiskLevel::UseWithCaution),
    ("avoid", RiskLevel::Avoid),
    ("contraindicated", RiskLevel::Contraindicated),
    ("contraindicado", RiskLevel::Contraindicated),
];

/// Trimester/safety proximity patterns. Both terms must sit in the same
/// sentence, at most 80 characters apart. Negation is not detected.
pub const TRIMESTER_PATTERNS: &[(&str, Trimester)] = &[
    (r"(?i)\bfirst trimester[^.\n]{0,80}\bsafe\b", Trimester::First),
    (r"(?i)\bprimer trimestre[^.\n]{0,80}\bsegur[oa]\b", Trimester::First),
    (r"(?i)\bsecond trimester[^.\n]{0,80}\bsafe\b", Trimester::Second),
    (r"(?i)\bsegundo trimestre[^.\n]{0,80}\bsegur[oa]\b", Trimester::Second),
    (r"(?i)\bthird trimester[^.\n]{0,80}\bsafe\b", Trimester::Third),
    (r"(?i)\btercer trimestre[^.\n]{0,80}\bsegur[oa]\b", Trimester::Third),
    (r"(?i)\bsafe\b[^.\n]{0,80}\bfirst trimester", Trimester::First),
    (r"(?i)\bsegur[oa]\b[^.\n]{0,80}\bprimer trimestre", Trimester::First),
    (r"(?i)\bsafe\b[^.\n]{0,80}\bsecond trimester", Trimester::Second),
    (r"(?i)\bsegur[oa]\b[^.\n]{0,80}\bsegundo trimestre", Trimester::Second),
    (r"(?i)\bsafe\b[^.\n]{0,80}\bthird trimester", Trimester::Third),
    (r"(?i)\bsegur[oa]\b[^.\n]{0,80}\btercer trimestre", Trimester::Third),
];

/// Pregnancy vocabulary for the narrative-notes extractor (bilingual).
pub const PREGNANCY_KEYWORDS: &[&str] = &[
    "pregnancy",
    "embarazo",
    "pregnant",
    "embarazada",
    "fetal",
    "feto",
    "maternal",
    "materna",
    "trimester",
    "trimestre",
    "gestation",
    "gestacion",
    "teratogenic",
    "teratogenico",
    "birth defect",
    "defecto congenito",
    "prenatal",
    "conception",
    "concepcion",
];

/// Narrower vocabulary for monograph pages, where "maternal" and friends
/// show up in unrelated boilerplate.
pub const MONOGRAPH_KEYWORDS: &[&str] = &["pregnancy", "pregnant", "fetal", "teratogenic"];

/// Recommendation/alternative/caution vocabulary (bilingual).
pub const RECOMMENDATION_KEYWORDS: &[&str] = &[
    "alternative",
    "alternativa",
    "instead",
    "en lugar de",
    "substitute",
    "sustituto",
    "recommend",
    "recomienda",
    "safer",
    "mas seguro",
    "avoid",
    "evitar",
    "caution",
    "precaucion",
];

pub(crate) fn category_regexes() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        CATEGORY_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("valid category pattern"))
            .collect()
    })
}

pub(crate) fn trimester_regexes() -> &'static [(Regex, Trimester)] {
    static RE: OnceLock<Vec<(Regex, Trimester)>> = OnceLock::new();
    RE.get_or_init(|| {
        TRIMESTER_PATTERNS
            .iter()
            .map(|(p, t)| (Regex::new(p).expect("valid trimester pattern"), *t))
            .collect()
    })
}

/// Case-insensitive substring test against a keyword table.
pub(crate) fn mentions_any(text_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text_lower.contains(kw))
}
