//! Extraction engine.
//!
//! Independent, pure extractors over validated page text. Each returns
//! `None` when nothing matches; none of them can fail. Sources pick which
//! extractors to run through an [`ExtractionProfile`].

pub mod category;
pub mod notes;
pub mod patterns;
pub mod recommendations;
pub mod risk_level;
pub mod trimester;

pub use category::extract_risk_category;
pub use notes::{extract_notes, NotesPolicy, Segmentation};
pub use recommendations::extract_recommendations;
pub use risk_level::extract_risk_level;
pub use trimester::extract_trimester_safety;

use gravida_common::{RiskCategory, RiskLevel, TrimesterSafety};

use crate::models::PartialRecord;

/// Which extractors a source runs, and how notes are cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionProfile {
    pub category: bool,
    pub risk_level: bool,
    pub notes: Option<NotesPolicy>,
    pub trimester: bool,
    pub recommendations: bool,
}

impl ExtractionProfile {
    /// Bilingual narrative monographs.
    pub const NARRATIVE: ExtractionProfile = ExtractionProfile {
        category: false,
        risk_level: true,
        notes: Some(NotesPolicy::NARRATIVE),
        trimester: true,
        recommendations: true,
    };

    /// Drug monograph detail pages.
    pub const MONOGRAPH: ExtractionProfile = ExtractionProfile {
        category: true,
        risk_level: false,
        notes: Some(NotesPolicy::MONOGRAPH),
        trimester: true,
        recommendations: true,
    };

    /// Registry result pages: only the letter category is looked for.
    pub const REGISTRY: ExtractionProfile = ExtractionProfile {
        category: true,
        risk_level: false,
        notes: None,
        trimester: false,
        recommendations: false,
    };

    pub fn apply(&self, text: &str) -> Extracted {
        Extracted {
            risk_category: self.category.then(|| extract_risk_category(text)).flatten(),
            risk_level: self.risk_level.then(|| extract_risk_level(text)).flatten(),
            notes: self.notes.as_ref().and_then(|policy| extract_notes(text, policy)),
            trimester_safety: self.trimester.then(|| extract_trimester_safety(text)).flatten(),
            recommendations: self
                .recommendations
                .then(|| extract_recommendations(text))
                .flatten(),
        }
    }
}

/// Fields pulled out of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub risk_category: Option<RiskCategory>,
    pub risk_level: Option<RiskLevel>,
    pub notes: Option<String>,
    pub trimester_safety: Option<TrimesterSafety>,
    pub recommendations: Option<String>,
}

impl Extracted {
    pub fn is_empty(&self) -> bool {
        self.risk_category.is_none()
            && self.risk_level.is_none()
            && self.notes.is_none()
            && self.trimester_safety.is_none()
            && self.recommendations.is_none()
    }

    /// Copy every present field onto `record`, leaving the rest untouched.
    pub fn apply_to(self, record: &mut PartialRecord) {
        if self.risk_category.is_some() {
            record.risk_category = self.risk_category;
        }
        if self.risk_level.is_some() {
            record.risk_level = self.risk_level;
        }
        if self.notes.is_some() {
            record.notes = self.notes;
        }
        if self.trimester_safety.is_some() {
            record.trimester_safety = self.trimester_safety;
        }
        if self.recommendations.is_some() {
            record.recommendations = self.recommendations;
        }
    }
}
