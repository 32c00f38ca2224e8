//! Multi-source consolidation.
//!
//! Partial records for one medication are ordered by source priority, then:
//! - category and risk level: first present value wins
//! - notes and recommendations: every present value kept, attributed by
//!   source when more than one contributes
//! - trimester safety: union of all flags
//! - confidence: sum of contributing source weights
//!
//! A record at or below the confidence floor is `Insufficient` and must not
//! be persisted.

use gravida_common::confidence::{aggregate_confidence, is_sufficient};
use gravida_common::{ConsolidatedRecord, SourceId, TrimesterSafety};

use crate::models::PartialRecord;

/// Separator between attributed per-source blocks.
const BLOCK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationPolicy {
    pub priority: Vec<SourceId>,
    pub min_confidence: u32,
}

impl Default for ConsolidationPolicy {
    fn default() -> Self {
        Self {
            priority: SourceId::default_priority(),
            min_confidence: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Consolidation {
    Record(ConsolidatedRecord),
    Insufficient { confidence: u32, sources: Vec<SourceId> },
}

impl Consolidation {
    pub fn confidence(&self) -> u32 {
        match self {
            Consolidation::Record(r) => r.confidence,
            Consolidation::Insufficient { confidence, .. } => *confidence,
        }
    }

    pub fn sources(&self) -> &[SourceId] {
        match self {
            Consolidation::Record(r) => &r.sources,
            Consolidation::Insufficient { sources, .. } => sources,
        }
    }
}

/// Merge with an explicit priority and the default floor.
pub fn merge(partials: &[PartialRecord], priority: &[SourceId]) -> Consolidation {
    merge_with(
        partials,
        &ConsolidationPolicy {
            priority: priority.to_vec(),
            ..ConsolidationPolicy::default()
        },
    )
}

pub fn merge_with(partials: &[PartialRecord], policy: &ConsolidationPolicy) -> Consolidation {
    let ordered = contributing_in_priority(partials, &policy.priority);
    let sources: Vec<SourceId> = ordered.iter().map(|p| p.source).collect();
    let confidence = aggregate_confidence(&sources);

    let Some(first) = ordered.first() else {
        return Consolidation::Insufficient { confidence, sources };
    };
    if !is_sufficient(confidence, policy.min_confidence) {
        return Consolidation::Insufficient { confidence, sources };
    }

    let trimester_safety = ordered
        .iter()
        .filter_map(|p| p.trimester_safety)
        .fold(TrimesterSafety::new(), |acc, t| acc.union(&t));

    let updated_at = ordered
        .iter()
        .map(|p| p.extracted_at)
        .max()
        .unwrap_or(first.extracted_at);

    Consolidation::Record(ConsolidatedRecord {
        name: first.name.clone(),
        risk_category: ordered.iter().find_map(|p| p.risk_category),
        risk_level: ordered.iter().find_map(|p| p.risk_level),
        notes: attributed(&ordered, |p| p.notes.clone()),
        trimester_safety: (!trimester_safety.is_empty()).then_some(trimester_safety),
        recommendations: attributed(&ordered, |p| p.recommendations.clone()),
        observations: attributed(&ordered, |p| p.registry.as_ref().and_then(|r| r.summary())),
        sources,
        confidence,
        updated_at,
    })
}

/// Partials that carry data, one per source, sorted by priority rank.
/// Sources missing from `priority` sort after ranked ones in input order.
fn contributing_in_priority<'a>(partials: &'a [PartialRecord], priority: &[SourceId]) -> Vec<&'a PartialRecord> {
    let rank = |source: SourceId| {
        priority
            .iter()
            .position(|s| *s == source)
            .unwrap_or(priority.len())
    };

    let mut ordered: Vec<&PartialRecord> = Vec::new();
    for partial in partials.iter().filter(|p| p.has_data()) {
        if !ordered.iter().any(|p| p.source == partial.source) {
            ordered.push(partial);
        }
    }
    ordered.sort_by_key(|p| rank(p.source));
    ordered
}

/// A lone value is kept verbatim; several are prefixed with `[source-id]`.
fn attributed(ordered: &[&PartialRecord], field: impl Fn(&PartialRecord) -> Option<String>) -> Option<String> {
    let values: Vec<(SourceId, String)> = ordered
        .iter()
        .filter_map(|p| field(p).map(|v| (p.source, v)))
        .collect();

    match values.len() {
        0 => None,
        1 => values.into_iter().next().map(|(_, v)| v),
        _ => Some(
            values
                .iter()
                .map(|(source, value)| format!("[{source}] {value}"))
                .collect::<Vec<_>>()
                .join(BLOCK_SEPARATOR),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegistryEntry;
    use chrono::{TimeZone, Utc};
    use gravida_common::{RiskCategory, RiskLevel, Trimester};
    use pretty_assertions::assert_eq;

    fn partial(source: SourceId) -> PartialRecord {
        let mut p = PartialRecord::new("ibuprofen", source);
        p.extracted_at = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
        p
    }

    #[test]
    fn test_priority_decides_category() {
        let mut registry = partial(SourceId::FdaOrangeBook);
        registry.risk_category = Some(RiskCategory::B);
        let mut narrative = partial(SourceId::ELactancia);
        narrative.risk_category = Some(RiskCategory::C);

        // input order must not matter
        let result = merge(&[narrative, registry], &SourceId::default_priority());
        let Consolidation::Record(record) = result else {
            panic!("expected a record");
        };
        assert_eq!(record.risk_category, Some(RiskCategory::B));
        assert_eq!(record.sources, vec![SourceId::FdaOrangeBook, SourceId::ELactancia]);
        assert_eq!(record.confidence, 5);
    }

    #[test]
    fn test_custom_priority_reorders() {
        let mut a = partial(SourceId::FdaOrangeBook);
        a.risk_category = Some(RiskCategory::B);
        let mut b = partial(SourceId::DrugsCom);
        b.risk_category = Some(RiskCategory::D);

        let result = merge(&[a, b], &[SourceId::DrugsCom, SourceId::FdaOrangeBook]);
        let Consolidation::Record(record) = result else {
            panic!("expected a record");
        };
        assert_eq!(record.risk_category, Some(RiskCategory::D));
    }

    #[test]
    fn test_threshold_boundary() {
        let mut narrative = partial(SourceId::ELactancia);
        narrative.risk_level = Some(RiskLevel::Low);
        let partials = [narrative];

        let at_floor = ConsolidationPolicy {
            min_confidence: 2,
            ..ConsolidationPolicy::default()
        };
        assert_eq!(
            merge_with(&partials, &at_floor),
            Consolidation::Insufficient {
                confidence: 2,
                sources: vec![SourceId::ELactancia]
            }
        );

        let below = ConsolidationPolicy {
            min_confidence: 1,
            ..ConsolidationPolicy::default()
        };
        assert!(matches!(merge_with(&partials, &below), Consolidation::Record(_)));
    }

    #[test]
    fn test_nothing_is_insufficient() {
        let empty = partial(SourceId::DrugsCom);
        assert_eq!(
            merge(&[empty], &SourceId::default_priority()),
            Consolidation::Insufficient {
                confidence: 0,
                sources: vec![]
            }
        );
        assert_eq!(merge(&[], &[]).confidence(), 0);
    }

    #[test]
    fn test_single_note_kept_verbatim() {
        let mut narrative = partial(SourceId::ELactancia);
        narrative.notes = Some("Only note.".into());
        let Consolidation::Record(record) = merge(&[narrative], &SourceId::default_priority()) else {
            panic!("expected a record");
        };
        assert_eq!(record.notes.as_deref(), Some("Only note."));
    }

    #[test]
    fn test_notes_attributed_in_priority_order() {
        let mut drugs = partial(SourceId::DrugsCom);
        drugs.notes = Some("Monograph note.".into());
        drugs.recommendations = Some("Prefer paracetamol.".into());
        let mut narrative = partial(SourceId::ELactancia);
        narrative.notes = Some("Narrative note.".into());

        let Consolidation::Record(record) = merge(&[drugs, narrative], &SourceId::default_priority()) else {
            panic!("expected a record");
        };
        assert_eq!(
            record.notes.as_deref(),
            Some("[e-lactancia] Narrative note.\n\n[drugs-com] Monograph note.")
        );
        assert_eq!(record.recommendations.as_deref(), Some("Prefer paracetamol."));
    }

    #[test]
    fn test_trimester_union_and_observations() {
        let mut registry = partial(SourceId::FdaOrangeBook);
        registry.registry = Some(RegistryEntry {
            application_number: Some("N017463".into()),
            ..RegistryEntry::default()
        });
        let mut a = partial(SourceId::ELactancia);
        a.trimester_safety = Some(TrimesterSafety::new().with(Trimester::First));
        let mut b = partial(SourceId::DrugsCom);
        b.trimester_safety = Some(TrimesterSafety::new().with(Trimester::Third));

        let Consolidation::Record(record) = merge(&[registry, a, b], &SourceId::default_priority()) else {
            panic!("expected a record");
        };
        assert_eq!(
            record.trimester_safety.map(|t| t.to_string()).as_deref(),
            Some("trimester 1, trimester 3")
        );
        assert_eq!(record.observations.as_deref(), Some("FDA Orange Book: application N017463"));
        assert_eq!(record.confidence, 6);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let mut registry = partial(SourceId::FdaOrangeBook);
        registry.risk_category = Some(RiskCategory::C);
        let mut narrative = partial(SourceId::ELactancia);
        narrative.notes = Some("n".into());
        let partials = vec![registry, narrative];

        let first = merge(&partials, &SourceId::default_priority());
        for _ in 0..5 {
            assert_eq!(merge(&partials, &SourceId::default_priority()), first);
        }
    }

    #[test]
    fn test_duplicate_source_counts_once() {
        let mut a = partial(SourceId::ELactancia);
        a.notes = Some("first".into());
        let mut b = partial(SourceId::ELactancia);
        b.notes = Some("second".into());
        let Consolidation::Record(record) = merge(&[a, b], &SourceId::default_priority()) else {
            panic!("expected a record");
        };
        assert_eq!(record.confidence, 2);
        assert_eq!(record.notes.as_deref(), Some("first"));
    }
}
