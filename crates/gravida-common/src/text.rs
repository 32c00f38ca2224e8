//! Text normalisation shared by extractors, adapters and the repository.

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cap `text` at `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Whitespace-normalise then cap; `None` when nothing is left.
pub fn clean_field(text: &str, max_chars: usize) -> Option<String> {
    let cleaned = truncate_chars(&normalize_whitespace(text), max_chars);
    let cleaned = cleaned.trim_end().to_string();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Canonical join key for a medication: trimmed, lower-cased, inner whitespace collapsed.
pub fn normalize_name(name: &str) -> String {
    normalize_whitespace(name).to_lowercase()
}

/// Case-insensitive count of non-overlapping occurrences of `needle`.
pub fn count_occurrences_ci(haystack: &str, needle: &str) -> usize {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return 0;
    }
    haystack.to_lowercase().matches(needle.as_str()).count()
}

/// True when `phrase` occurs in `haystack_lower` delimited by non-alphanumeric
/// characters (or the string ends). Both arguments must already be lower-case.
pub fn contains_phrase(haystack_lower: &str, phrase: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack_lower[start..].find(phrase) {
        let begin = start + pos;
        let end = begin + phrase.len();
        let before_ok = haystack_lower[..begin]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack_lower[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = begin + phrase.chars().next().map_or(1, char::len_utf8);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("embarazo", 3), "emb");
        assert_eq!(truncate_chars("ñandú", 4), "ñand");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_clean_field_absent_for_blank() {
        assert_eq!(clean_field(" \n ", 10), None);
        assert_eq!(clean_field(" x  y ", 10).as_deref(), Some("x y"));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Folic   Acid "), "folic acid");
    }

    #[test]
    fn test_count_occurrences_ci() {
        assert_eq!(count_occurrences_ci("Ibuprofen and IBUPROFEN", "ibuprofen"), 2);
        assert_eq!(count_occurrences_ci("anything", "  "), 0);
    }

    #[test]
    fn test_contains_phrase_word_boundaries() {
        assert!(contains_phrase("this is compatible with", "compatible"));
        assert!(!contains_phrase("this is incompatible with", "compatible"));
        assert!(contains_phrase("incompatible, but compatible later", "compatible"));
        assert!(contains_phrase("low risk", "low risk"));
        assert!(!contains_phrase("below risk", "low risk"));
    }
}
