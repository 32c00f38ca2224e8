/// Core domain types shared by the ingestion pipeline and the repository.
/// `ConsolidatedRecord` mirrors the persisted `medications` row.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GravidaError;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// External web origin providing drug-safety information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceId {
    /// FDA Orange Book registry (official, tabular).
    FdaOrangeBook,
    /// e-lactancia.org narrative monographs (bilingual).
    ELactancia,
    /// drugs.com search + monograph detail page.
    DrugsCom,
    /// drugs.com pregnancy catalog, crawled in bulk.
    DrugsComCatalog,
}

impl SourceId {
    pub const ALL: [SourceId; 4] = [
        SourceId::FdaOrangeBook,
        SourceId::ELactancia,
        SourceId::DrugsCom,
        SourceId::DrugsComCatalog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::FdaOrangeBook   => "fda-orange-book",
            SourceId::ELactancia      => "e-lactancia",
            SourceId::DrugsCom        => "drugs-com",
            SourceId::DrugsComCatalog => "drugs-com-catalog",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceId::FdaOrangeBook   => "FDA Orange Book",
            SourceId::ELactancia      => "e-lactancia.org",
            SourceId::DrugsCom        => "drugs.com",
            SourceId::DrugsComCatalog => "drugs.com pregnancy catalog",
        }
    }

    /// Fixed contribution of this source to the aggregate confidence score.
    /// Official registry > narrative clinical content > heuristic search hits.
    pub fn weight(&self) -> u32 {
        match self {
            SourceId::FdaOrangeBook   => 3,
            SourceId::ELactancia      => 2,
            SourceId::DrugsCom        => 1,
            SourceId::DrugsComCatalog => 2,
        }
    }

    /// Default merge priority: official/registry, then narrative, then heuristic category sources.
    pub fn default_priority() -> Vec<SourceId> {
        Self::ALL.to_vec()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = GravidaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SourceId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| GravidaError::Parse(format!("unknown source id: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Risk category (letter grade)
// ---------------------------------------------------------------------------

/// Letter-graded pregnancy risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    A,
    B,
    C,
    D,
    X,
}

impl RiskCategory {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(RiskCategory::A),
            'B' => Some(RiskCategory::B),
            'C' => Some(RiskCategory::C),
            'D' => Some(RiskCategory::D),
            'X' => Some(RiskCategory::X),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::A => "A",
            RiskCategory::B => "B",
            RiskCategory::C => "C",
            RiskCategory::D => "D",
            RiskCategory::X => "X",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskCategory {
    type Err = GravidaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => RiskCategory::from_letter(c)
                .ok_or_else(|| GravidaError::Parse(format!("invalid risk category: {s}"))),
            _ => Err(GravidaError::Parse(format!("invalid risk category: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Risk level (narrative severity label)
// ---------------------------------------------------------------------------

/// Coarse severity label published by narrative sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
    Compatible,
    ProbablyCompatible,
    UseWithCaution,
    Avoid,
    Contraindicated,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 10] = [
        RiskLevel::VeryLow,
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::VeryHigh,
        RiskLevel::Compatible,
        RiskLevel::ProbablyCompatible,
        RiskLevel::UseWithCaution,
        RiskLevel::Avoid,
        RiskLevel::Contraindicated,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow            => "Very Low Risk",
            RiskLevel::Low                => "Low Risk",
            RiskLevel::Moderate           => "Moderate Risk",
            RiskLevel::High               => "High Risk",
            RiskLevel::VeryHigh           => "Very High Risk",
            RiskLevel::Compatible         => "Compatible",
            RiskLevel::ProbablyCompatible => "Probably Compatible",
            RiskLevel::UseWithCaution     => "Use With Caution",
            RiskLevel::Avoid              => "Avoid",
            RiskLevel::Contraindicated    => "Contraindicated",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        RiskLevel::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Trimester safety
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trimester {
    First,
    Second,
    Third,
}

impl Trimester {
    pub const ALL: [Trimester; 3] = [Trimester::First, Trimester::Second, Trimester::Third];

    /// 1-based trimester number.
    pub fn number(&self) -> u8 {
        match self {
            Trimester::First  => 1,
            Trimester::Second => 2,
            Trimester::Third  => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Trimester::First),
            2 => Some(Trimester::Second),
            3 => Some(Trimester::Third),
            _ => None,
        }
    }
}

/// Set of trimesters flagged as safe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimesterSafety {
    flags: [bool; 3],
}

impl TrimesterSafety {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, trimester: Trimester) {
        self.flags[usize::from(trimester.number() - 1)] = true;
    }

    pub fn with(mut self, trimester: Trimester) -> Self {
        self.mark(trimester);
        self
    }

    pub fn contains(&self, trimester: Trimester) -> bool {
        self.flags[usize::from(trimester.number() - 1)]
    }

    pub fn is_empty(&self) -> bool {
        !self.flags.iter().any(|f| *f)
    }

    /// A trimester is safe in the union if any side flags it.
    pub fn union(&self, other: &TrimesterSafety) -> TrimesterSafety {
        let mut out = *self;
        for (i, flag) in other.flags.iter().enumerate() {
            out.flags[i] |= *flag;
        }
        out
    }

    pub fn trimesters(&self) -> impl Iterator<Item = Trimester> + '_ {
        Trimester::ALL.into_iter().filter(|t| self.contains(*t))
    }
}

impl fmt::Display for TrimesterSafety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .trimesters()
            .map(|t| format!("trimester {}", t.number()))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

impl FromStr for TrimesterSafety {
    type Err = GravidaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut safety = TrimesterSafety::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let number = part
                .strip_prefix("trimester")
                .map(str::trim)
                .and_then(|n| n.parse::<u8>().ok())
                .and_then(Trimester::from_number)
                .ok_or_else(|| GravidaError::Parse(format!("invalid trimester entry: {part}")))?;
            safety.mark(number);
        }
        Ok(safety)
    }
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Spanish,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
        }
    }
}

// ---------------------------------------------------------------------------
// Consolidated record (persisted entity)
// ---------------------------------------------------------------------------

/// Multi-source merged record for one medication, keyed by normalised name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRecord {
    pub name: String,
    pub risk_category: Option<RiskCategory>,
    pub risk_level: Option<RiskLevel>,
    pub notes: Option<String>,
    pub trimester_safety: Option<TrimesterSafety>,
    pub recommendations: Option<String>,
    /// Registry summary (application number, applicant, approval date).
    pub observations: Option<String>,
    /// Contributing sources in priority order.
    pub sources: Vec<SourceId>,
    pub confidence: u32,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_round_trips_through_str() {
        for id in SourceId::ALL {
            assert_eq!(id.as_str().parse::<SourceId>().unwrap(), id);
        }
        assert!(matches!("webmd".parse::<SourceId>(), Err(GravidaError::Parse(_))));
    }

    #[test]
    fn test_serde_matches_as_str() {
        let json = serde_json::to_string(&SourceId::ELactancia).unwrap();
        assert_eq!(json, "\"e-lactancia\"");
    }

    #[test]
    fn test_registry_outweighs_narrative() {
        assert!(SourceId::FdaOrangeBook.weight() > SourceId::ELactancia.weight());
        assert!(SourceId::ELactancia.weight() > SourceId::DrugsCom.weight());
    }

    #[test]
    fn test_risk_category_parse() {
        assert_eq!("x".parse::<RiskCategory>().unwrap(), RiskCategory::X);
        assert!("E".parse::<RiskCategory>().is_err());
        assert!("AB".parse::<RiskCategory>().is_err());
    }

    #[test]
    fn test_risk_level_label_lookup_is_case_insensitive() {
        assert_eq!(RiskLevel::from_label("low risk"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_label("Muy Bajo Riesgo"), None);
    }

    #[test]
    fn test_trimester_safety_display_and_parse() {
        let safety = TrimesterSafety::new()
            .with(Trimester::Third)
            .with(Trimester::First);
        assert_eq!(safety.to_string(), "trimester 1, trimester 3");
        assert_eq!("trimester 1, trimester 3".parse::<TrimesterSafety>().unwrap(), safety);
        assert!("trimester 4".parse::<TrimesterSafety>().is_err());
    }

    #[test]
    fn test_trimester_union() {
        let a = TrimesterSafety::new().with(Trimester::First);
        let b = TrimesterSafety::new().with(Trimester::Second);
        let u = a.union(&b);
        assert!(u.contains(Trimester::First));
        assert!(u.contains(Trimester::Second));
        assert!(!u.contains(Trimester::Third));
        assert!(TrimesterSafety::new().is_empty());
    }
}
