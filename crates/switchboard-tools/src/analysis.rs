//! Local (model-free) document analysis.
//!
//! Produces the report returned when no text model is available, and the
//! summary stored on the session for later email turns.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

const SUMMARY_SENTENCES: usize = 3;
const MIN_SENTENCE_CHARS: usize = 20;
const MIN_KEY_POINT_CHARS: usize = 20;
const MIN_FALLBACK_POINT_CHARS: usize = 30;
const MAX_KEY_POINTS: usize = 10;
const RENDERED_KEY_POINTS: usize = 8;

static PAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--- Page \d+ ---$").expect("Invalid analysis regex"));
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").expect("Invalid analysis regex"));
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.").expect("Invalid analysis regex"));
static LABELLED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+:").expect("Invalid analysis regex"));
static HEADINGS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"^[A-Z][A-Z\s]{10,}$").expect("Invalid analysis regex"),
        Regex::new(r"^\d+\.\s+[A-Z]").expect("Invalid analysis regex"),
        Regex::new(r"^[IVX]+\.\s+[A-Z]").expect("Invalid analysis regex"),
    ]
});

const KEY_POINT_WORDS: &[&str] = &[
    "important",
    "key",
    "summary",
    "conclusion",
    "recommendation",
    "finding",
    "result",
];

/// Coarse document genre, guessed from vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    ResearchPaper,
    LegalDocument,
    FinancialDocument,
    Resume,
    General,
}

impl ContentType {
    const RULES: [(ContentType, &'static [&'static str]); 4] = [
        (ContentType::ResearchPaper, &["research", "study", "methodology", "results"]),
        (ContentType::LegalDocument, &["contract", "agreement", "terms", "conditions"]),
        (ContentType::FinancialDocument, &["invoice", "receipt", "payment", "total"]),
        (ContentType::Resume, &["resume", "cv", "experience", "skills"]),
    ];

    fn detect(words: &HashSet<String>) -> Self {
        Self::RULES
            .iter()
            .find(|(_, keys)| keys.iter().any(|k| words.contains(*k)))
            .map(|(t, _)| *t)
            .unwrap_or(ContentType::General)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentType::ResearchPaper => "Research paper",
            ContentType::LegalDocument => "Legal document",
            ContentType::FinancialDocument => "Financial document",
            ContentType::Resume => "Resume",
            ContentType::General => "General document",
        };
        f.write_str(label)
    }
}

/// Locally computed overview of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub page_count: usize,
    pub word_count: usize,
    pub summary: String,
    pub key_points: Vec<String>,
    pub has_headings: bool,
    pub has_lists: bool,
    pub content_type: ContentType,
}

impl DocumentReport {
    pub fn render(&self) -> String {
        let mut structure = Vec::new();
        if self.has_headings {
            structure.push("headings");
        }
        if self.has_lists {
            structure.push("lists");
        }
        let structure = if structure.is_empty() {
            "plain text".to_string()
        } else {
            structure.join(", ")
        };

        let mut out = format!(
            "PDF Analysis Report\n\nPages: {}\nContent type: {}\nWord count: {}\nStructure: {}\n\nSummary:\n{}",
            self.page_count,
            self.content_type,
            self.word_count,
            structure,
            if self.summary.is_empty() { "(no summary available)" } else { self.summary.as_str() }
        );
        if !self.key_points.is_empty() {
            out.push_str("\n\nKey points:");
            for (i, point) in self.key_points.iter().take(RENDERED_KEY_POINTS).enumerate() {
                out.push_str(&format!("\n{}. {}", i + 1, point));
            }
        }
        out
    }
}

/// Lines of extracted text without page markers.
fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !PAGE_MARKER.is_match(l))
}

fn sentences(text: &str, min_chars: usize) -> Vec<String> {
    let body = content_lines(text).collect::<Vec<_>>().join(" ");
    SENTENCE_END
        .split(&body)
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| s.chars().count() > min_chars)
        .collect()
}

/// First meaningful sentences, capped at `max_chars`.
pub fn summarize(text: &str, max_chars: usize) -> String {
    let picked = sentences(text, MIN_SENTENCE_CHARS);
    if picked.is_empty() {
        return String::new();
    }
    let summary = format!(
        "{}.",
        picked.into_iter().take(SUMMARY_SENTENCES).collect::<Vec<_>>().join(". ")
    );
    if summary.chars().count() > max_chars {
        let cut: String = summary.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    } else {
        summary
    }
}

fn is_bullet(line: &str) -> bool {
    line.starts_with(['•', '-', '*']) || NUMBERED.is_match(line)
}

pub fn key_points(text: &str) -> Vec<String> {
    let mut points: Vec<String> = content_lines(text)
        .filter(|l| l.chars().count() >= MIN_KEY_POINT_CHARS)
        .filter(|l| {
            let lower = l.to_lowercase();
            is_bullet(l) || LABELLED.is_match(l) || KEY_POINT_WORDS.iter().any(|k| lower.contains(k))
        })
        .take(MAX_KEY_POINTS)
        .map(str::to_string)
        .collect();

    if points.is_empty() {
        points = sentences(text, MIN_FALLBACK_POINT_CHARS)
            .into_iter()
            .take(MAX_KEY_POINTS)
            .collect();
    }
    points
}

/// Full local analysis of extracted text.
pub fn analyze(text: &str, page_count: usize, summary_chars: usize) -> DocumentReport {
    let lines: Vec<&str> = content_lines(text).collect();
    let has_headings = lines.iter().any(|l| HEADINGS.iter().any(|re| re.is_match(l)));
    let has_lists = lines.iter().any(|l| is_bullet(l));

    let words: HashSet<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    let word_count = lines.iter().map(|l| l.split_whitespace().count()).sum();

    DocumentReport {
        page_count,
        word_count,
        summary: summarize(text, summary_chars),
        key_points: key_points(text),
        has_headings,
        has_lists,
        content_type: ContentType::detect(&words),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "--- Page 1 ---\n\
        QUARTERLY BUSINESS REVIEW\n\
        This report covers revenue and hiring for the third quarter.\n\
        Revenue grew by twelve percent compared to last year.\n\
        - Key finding: customer churn dropped below five percent\n\
        - Short item\n\
        --- Page 2 ---\n\
        Conclusion: the invoice backlog was cleared before the deadline.";

    #[test]
    fn test_summary_skips_markers_and_short_sentences() {
        let summary = summarize(REPORT, 500);
        assert!(summary.starts_with("QUARTERLY BUSINESS REVIEW This report covers revenue"));
        assert!(!summary.contains("--- Page"));
        assert!(summary.ends_with('.'));
    }

    #[test]
    fn test_summary_truncates() {
        let summary = summarize(REPORT, 30);
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= 33);
    }

    #[test]
    fn test_summary_empty_text() {
        assert_eq!(summarize("", 100), "");
        assert_eq!(summarize("Too short.", 100), "");
    }

    #[test]
    fn test_key_points_prefers_structured_lines() {
        let points = key_points(REPORT);
        assert_eq!(
            points,
            vec![
                "- Key finding: customer churn dropped below five percent".to_string(),
                "Conclusion: the invoice backlog was cleared before the deadline.".to_string(),
            ]
        );
    }

    #[test]
    fn test_key_points_falls_back_to_sentences() {
        let text = "The committee met on Tuesday to discuss the new building. Everyone agreed the design was acceptable overall.";
        let points = key_points(text);
        assert_eq!(points.len(), 2);
        assert!(points[0].starts_with("The committee met"));
    }

    #[test]
    fn test_structure_and_type() {
        let report = analyze(REPORT, 2, 500);
        assert_eq!(report.page_count, 2);
        assert!(report.has_headings);
        assert!(report.has_lists);
        assert_eq!(report.content_type, ContentType::FinancialDocument);
        assert!(report.word_count > 20);
    }

    #[test]
    fn test_content_type_uses_whole_words() {
        let report = analyze("The cvs pharmacy story is a general piece of writing about towns.", 1, 500);
        assert_eq!(report.content_type, ContentType::General);
        let report = analyze("Skills: Rust, SQL. Experience: five years.", 1, 500);
        assert_eq!(report.content_type, ContentType::Resume);
    }

    #[test]
    fn test_render() {
        let text = analyze(REPORT, 2, 500).render();
        assert!(text.starts_with("PDF Analysis Report\n\nPages: 2\nContent type: Financial document"));
        assert!(text.contains("Structure: headings, lists"));
        assert!(text.contains("Key points:\n1. - Key finding"));
    }
}
