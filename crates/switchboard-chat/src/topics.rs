//! Coarse topic tagging for follow-up detection.
//!
//! Tags come from a fixed keyword table. Matching is plain case-insensitive
//! substring containment, so short keywords such as `ai` also fire inside
//! longer words. Memory only needs an overlap signal between adjacent turns,
//! so that coarseness is acceptable.

use std::collections::BTreeSet;

/// Set of topic tags. Ordered so summaries and logs are stable.
pub type TopicSet = BTreeSet<&'static str>;

const TOPIC_TABLE: &[(&str, &[&str])] = &[
    (
        "programming",
        &[
            "java",
            "python",
            "javascript",
            "c++",
            "programming",
            "code",
            "developer",
            "switch",
            "case",
            "if-else",
            "function",
            "class",
            "object",
            "variable",
        ],
    ),
    (
        "ai",
        &["ai", "artificial intelligence", "machine learning", "ml", "neural network"],
    ),
    (
        "technology",
        &["technology", "tech", "software", "computer", "digital", "programming"],
    ),
    ("science", &["science", "scientific", "research", "experiment"]),
    ("weather", &["weather", "temperature", "climate", "forecast"]),
    ("news", &["news", "headlines", "current events", "breaking"]),
    ("education", &["education", "learn", "study", "teaching", "school"]),
    ("business", &["business", "company", "industry", "market"]),
    ("health", &["health", "medical", "medicine", "doctor"]),
    ("email", &["email", "send email", "gmail", "outlook", "mail"]),
    ("pdf", &["pdf", "document", "file", "read pdf"]),
    ("calculation", &["calculate", "math", "equation", "solve"]),
    (
        "image",
        &["image", "picture", "photo", "analyze this", "what is in this image"],
    ),
];

/// Derives topic tags from free text.
pub struct TopicExtractor;

impl TopicExtractor {
    /// Every tag with at least one keyword contained in `text`.
    pub fn topics(text: &str) -> TopicSet {
        if text.trim().is_empty() {
            return TopicSet::new();
        }
        let lower = text.to_lowercase();
        TOPIC_TABLE
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(tag, _)| *tag)
            .collect()
    }

    /// All tags the table can produce.
    pub fn known_topics() -> impl Iterator<Item = &'static str> {
        TOPIC_TABLE.iter().map(|(tag, _)| *tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(TopicExtractor::topics("").is_empty());
        assert!(TopicExtractor::topics("   \n").is_empty());
    }

    #[test]
    fn test_single_topic() {
        let topics = TopicExtractor::topics("What's the weather like?");
        assert_eq!(topics.into_iter().collect::<Vec<_>>(), vec!["weather"]);
    }

    #[test]
    fn test_case_insensitive() {
        assert!(TopicExtractor::topics("Latest HEADLINES please").contains("news"));
    }

    #[test]
    fn test_multiple_topics() {
        let topics = TopicExtractor::topics("write python code and email it to me");
        assert!(topics.contains("programming"));
        assert!(topics.contains("email"));
    }

    #[test]
    fn test_keyword_shared_between_topics() {
        let topics = TopicExtractor::topics("programming");
        assert!(topics.contains("programming"));
        assert!(topics.contains("technology"));
    }

    #[test]
    fn test_substring_matching_is_coarse() {
        // "ai" sits inside "explain"
        assert!(TopicExtractor::topics("explain").contains("ai"));
    }

    #[test]
    fn test_idempotent() {
        let text = "Summarize this PDF document about machine learning research";
        assert_eq!(TopicExtractor::topics(text), TopicExtractor::topics(text));
    }

    #[test]
    fn test_known_topics() {
        let known: Vec<_> = TopicExtractor::known_topics().collect();
        assert_eq!(known.len(), 13);
        assert!(known.contains(&"calculation"));
    }
}
