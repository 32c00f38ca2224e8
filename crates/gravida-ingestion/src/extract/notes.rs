//! Narrative clinical-notes extractor.

use gravida_common::text::{normalize_whitespace, truncate_chars};

use super::patterns::{mentions_any, MONOGRAPH_KEYWORDS, PREGNANCY_KEYWORDS};

/// How the document is cut into candidate segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segmentation {
    /// One segment per rendered line (block element).
    Lines,
    /// One segment per sentence (terminal `.`, `!` or `?`, or a line break).
    Sentences,
}

/// Per-source tuning of the notes extractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotesPolicy {
    pub segmentation: Segmentation,
    /// A segment qualifies only when its trimmed length exceeds this.
    pub min_chars: usize,
    pub max_chars: usize,
    pub max_segments: usize,
    pub delimiter: &'static str,
    pub keywords: &'static [&'static str],
}

impl NotesPolicy {
    /// Long narrative paragraphs (e-lactancia).
    pub const NARRATIVE: NotesPolicy = NotesPolicy {
        segmentation: Segmentation::Lines,
        min_chars: 100,
        max_chars: 400,
        max_segments: 3,
        delimiter: " || ",
        keywords: PREGNANCY_KEYWORDS,
    };

    /// Monograph sentences (drugs.com).
    pub const MONOGRAPH: NotesPolicy = NotesPolicy {
        segmentation: Segmentation::Sentences,
        min_chars: 50,
        max_chars: 300,
        max_segments: 2,
        delimiter: " | ",
        keywords: MONOGRAPH_KEYWORDS,
    };
}

pub fn extract_notes(text: &str, policy: &NotesPolicy) -> Option<String> {
    let segments: Vec<&str> = match policy.segmentation {
        Segmentation::Lines => text.lines().collect(),
        Segmentation::Sentences => split_sentences(text),
    };

    let mut picked: Vec<String> = Vec::new();
    for segment in segments {
        let segment = segment.trim();
        if segment.chars().count() <= policy.min_chars {
            continue;
        }
        if !mentions_any(&segment.to_lowercase(), policy.keywords) {
            continue;
        }
        let cleaned = truncate_chars(&normalize_whitespace(segment), policy.max_chars);
        if !picked.contains(&cleaned) {
            picked.push(cleaned);
        }
        if picked.len() == policy.max_segments {
            break;
        }
    }

    if picked.is_empty() {
        None
    } else {
        Some(picked.join(policy.delimiter))
    }
}

/// Split on sentence terminators followed by whitespace, and on line breaks.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for line in text.lines() {
        let mut start = 0;
        let mut chars = line.char_indices().peekable();
        while let Some((idx, c)) = chars.next() {
            if matches!(c, '.' | '!' | '?') {
                let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
                if at_boundary {
                    let end = idx + c.len_utf8();
                    out.push(&line[start..end]);
                    start = end;
                }
            }
        }
        if start < line.len() {
            out.push(&line[start..]);
        }
    }
    out.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_NOTE: &str = "Ibuprofen use during pregnancy is generally considered low risk before twenty weeks of gestation, per clinical data.";

    #[test]
    fn test_single_qualifying_line() {
        let text = format!("Ibuprofen\nShort pregnancy line.\n{LONG_NOTE}\nFooter");
        assert_eq!(
            extract_notes(&text, &NotesPolicy::NARRATIVE).as_deref(),
            Some(LONG_NOTE)
        );
    }

    #[test]
    fn test_length_must_exceed_threshold() {
        let exactly: String = "pregnancy ".repeat(10);
        assert_eq!(exactly.trim().chars().count(), 99);
        assert_eq!(extract_notes(exactly.trim(), &NotesPolicy::NARRATIVE), None);

        let over = format!("{} ab", exactly.trim());
        assert!(extract_notes(&over, &NotesPolicy::NARRATIVE).is_some());
    }

    #[test]
    fn test_keyword_required() {
        let text = "x".repeat(200);
        assert_eq!(extract_notes(&text, &NotesPolicy::NARRATIVE), None);
    }

    #[test]
    fn test_cap_dedup_and_limit_preserve_order() {
        let a = format!("First: {}", "pregnancy data ".repeat(40));
        let b = format!("Second: {}", "fetal outcome ".repeat(10));
        let c = format!("Third: {}", "trimester risk ".repeat(10));
        let d = format!("Fourth: {}", "maternal level ".repeat(10));
        let text = [a.as_str(), a.as_str(), b.as_str(), c.as_str(), d.as_str()].join("\n");

        let notes = extract_notes(&text, &NotesPolicy::NARRATIVE).unwrap();
        let parts: Vec<&str> = notes.split(" || ").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].chars().count(), 400);
        assert!(parts[0].starts_with("First:"));
        assert!(parts[1].starts_with("Second:"));
        assert!(parts[2].starts_with("Third:"));
    }

    #[test]
    fn test_monograph_sentences() {
        let text = "Header. This medicine may cause fetal harm when administered to a pregnant woman. \
                    Unrelated sentence that is long enough to pass the length threshold easily. \
                    Use during pregnancy only if the potential benefit justifies the risk to the fetus.";
        let notes = extract_notes(text, &NotesPolicy::MONOGRAPH).unwrap();
        assert_eq!(
            notes,
            "This medicine may cause fetal harm when administered to a pregnant woman. | \
             Use during pregnancy only if the potential benefit justifies the risk to the fetus."
        );
    }

    #[test]
    fn test_split_sentences_keeps_decimals() {
        assert_eq!(
            split_sentences("Dose 2.5 mg daily. Next one!\nLine two"),
            vec!["Dose 2.5 mg daily.", "Next one!", "Line two"]
        );
    }
}
