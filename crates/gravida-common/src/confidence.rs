/// Confidence scoring for consolidated records.
///
/// Each source carries a fixed integer weight (see `SourceId::weight`).
/// A record's confidence is the plain sum of the weights of every source
/// that contributed at least one field. There is no voting or decay.

use crate::entities::SourceId;

/// Sum the weights of the contributing sources, counting each source once.
pub fn aggregate_confidence(contributors: &[SourceId]) -> u32 {
    let mut seen: Vec<SourceId> = Vec::with_capacity(contributors.len());
    let mut total = 0;
    for source in contributors {
        if !seen.contains(source) {
            seen.push(*source);
            total += source.weight();
        }
    }
    total
}

/// A record is persisted only when its confidence is strictly above the floor.
pub fn is_sufficient(confidence: u32, min_confidence: u32) -> bool {
    confidence > min_confidence
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(aggregate_confidence(&[]), 0);
    }

    #[test]
    fn test_sum_of_weights() {
        let total = aggregate_confidence(&[SourceId::FdaOrangeBook, SourceId::ELactancia]);
        assert_eq!(total, 5);
    }

    #[test]
    fn test_duplicate_source_counted_once() {
        let total = aggregate_confidence(&[SourceId::ELactancia, SourceId::ELactancia]);
        assert_eq!(total, SourceId::ELactancia.weight());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(!is_sufficient(2, 2));
        assert!(is_sufficient(3, 2));
        assert!(!is_sufficient(0, 0));
    }
}
