//! Completeness report over the stored records.

use std::fmt;

use gravida_common::ConsolidatedRecord;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub total: usize,
    pub missing_category: usize,
    pub missing_notes: usize,
    pub missing_trimester: usize,
    pub with_observations: usize,
}

impl ValidationReport {
    pub fn from_records(records: &[ConsolidatedRecord]) -> Self {
        let mut report = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            if record.risk_category.is_none() {
                report.missing_category += 1;
            }
            if record.notes.is_none() {
                report.missing_notes += 1;
            }
            if record.trimester_safety.map_or(true, |t| t.is_empty()) {
                report.missing_trimester += 1;
            }
            if record.observations.is_some() {
                report.with_observations += 1;
            }
        }
        report
    }

    /// Share of records carrying a risk category, in percent.
    pub fn category_coverage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.total - self.missing_category) as f64 * 100.0 / self.total as f64
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Medication store report")?;
        writeln!(f, "  total records:          {}", self.total)?;
        writeln!(
            f,
            "  without risk category:  {} ({:.1}% covered)",
            self.missing_category,
            self.category_coverage()
        )?;
        writeln!(f, "  without notes:          {}", self.missing_notes)?;
        writeln!(f, "  without trimester info: {}", self.missing_trimester)?;
        write!(f, "  with registry data:     {}", self.with_observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gravida_common::{RiskCategory, SourceId, Trimester, TrimesterSafety};

    fn bare(name: &str) -> ConsolidatedRecord {
        ConsolidatedRecord {
            name: name.to_string(),
            risk_category: None,
            risk_level: None,
            notes: None,
            trimester_safety: None,
            recommendations: None,
            observations: None,
            sources: vec![SourceId::DrugsCom],
            confidence: 2,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_counts_missing_fields() {
        let mut full = bare("ibuprofen");
        full.risk_category = Some(RiskCategory::D);
        full.notes = Some("note".into());
        full.trimester_safety = Some(TrimesterSafety::new().with(Trimester::First));
        full.observations = Some("FDA Orange Book: N017463".into());

        let report = ValidationReport::from_records(&[full, bare("aspirin")]);
        assert_eq!(
            report,
            ValidationReport {
                total: 2,
                missing_category: 1,
                missing_notes: 1,
                missing_trimester: 1,
                with_observations: 1,
            }
        );
        assert!((report.category_coverage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_store_renders() {
        let report = ValidationReport::from_records(&[]);
        assert_eq!(report.category_coverage(), 0.0);
        assert!(report.to_string().contains("total records:          0"));
    }
}
