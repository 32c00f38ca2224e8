//! Trimester-safety proximity extractor.
//!
//! Flags a trimester when an ordinal trimester term and a safety term sit
//! close together in one sentence. Negated phrasing ("not safe in the first
//! trimester") still flags the trimester; callers treat the result as a
//! coarse hint.

use gravida_common::TrimesterSafety;

use super::patterns::trimester_regexes;

pub fn extract_trimester_safety(text: &str) -> Option<TrimesterSafety> {
    let mut safety = TrimesterSafety::new();
    for (re, trimester) in trimester_regexes() {
        if !safety.contains(*trimester) && re.is_match(text) {
            safety.mark(*trimester);
        }
    }
    if safety.is_empty() {
        None
    } else {
        Some(safety)
    }
}
