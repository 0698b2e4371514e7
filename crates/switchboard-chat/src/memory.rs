//! Bounded per-session conversation memory.
//!
//! Holds the last `capacity` interactions in arrival order, renders the
//! context block handed to the text model, and answers whether a new
//! message continues the previous turn.

use std::collections::VecDeque;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;

use switchboard_core::config::MemoryConfig;
use switchboard_core::TurnTag;

use crate::topics::{TopicExtractor, TopicSet};

/// Returned by [`ConversationMemory::get_context`] when nothing is stored.
pub const NO_HISTORY: &str = "No previous conversation.";

const TRUNCATION_MARKER: &str = "...";

/// Single-word references to something said earlier. Matched as whole words.
static FOLLOW_UP_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:it|that|this|those|these|also)\b").expect("Invalid follow-up regex")
});

/// Multi-word continuation phrases. Matched as substrings.
const FOLLOW_UP_PHRASES: &[&str] = &[
    "how about",
    "what about",
    "and what",
    "in that case",
    "following that",
    "regarding",
    "more about",
    "tell me more",
    "explain further",
];

/// One stored turn. Created once by [`ConversationMemory::add_interaction`]
/// and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interaction {
    /// Position in the session, starting at 1. Survives eviction.
    pub seq: u64,
    /// Unix epoch seconds.
    pub timestamp: i64,
    pub user_text: String,
    pub response_text: String,
    pub tag: Option<TurnTag>,
    pub topics: TopicSet,
}

/// FIFO log of recent interactions plus the session's accumulated topics.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    capacity: usize,
    context_window: usize,
    preview_chars: usize,
    records: VecDeque<Interaction>,
    topics: TopicSet,
    total: u64,
}

impl ConversationMemory {
    /// Memory holding at most `capacity` interactions (at least one).
    pub fn new(capacity: usize) -> Self {
        Self::from_config(&MemoryConfig {
            capacity,
            ..MemoryConfig::default()
        })
    }

    pub fn from_config(config: &MemoryConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            capacity,
            context_window: config.context_window,
            preview_chars: config.response_preview_chars,
            records: VecDeque::with_capacity(capacity + 1),
            topics: TopicSet::new(),
            total: 0,
        }
    }

    /// Append one interaction, evicting the oldest when over capacity.
    pub fn add_interaction(
        &mut self,
        user_text: &str,
        response_text: &str,
        tag: Option<TurnTag>,
    ) -> &Interaction {
        let topics = TopicExtractor::topics(&format!("{} {}", user_text, response_text));
        self.topics.extend(topics.iter().copied());
        self.total += 1;

        self.records.push_back(Interaction {
            seq: self.total,
            timestamp: Utc::now().timestamp(),
            user_text: user_text.to_string(),
            response_text: response_text.to_string(),
            tag,
            topics,
        });
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
        // push_back above guarantees a last element
        &self.records[self.records.len() - 1]
    }

    /// Context block over the configured window.
    pub fn get_context(&self) -> String {
        self.context(self.context_window)
    }

    /// Render the last `window` interactions for a model prompt.
    pub fn context(&self, window: usize) -> String {
        if self.records.is_empty() || window == 0 {
            return NO_HISTORY.to_string();
        }
        let skip = self.records.len().saturating_sub(window);
        let mut out = String::from("Conversation history:\n");
        for (i, record) in self.records.iter().skip(skip).enumerate() {
            out.push_str(&format!("Exchange {}:\n", i + 1));
            out.push_str(&format!("  User: {}\n", record.user_text));
            out.push_str(&format!(
                "  Assistant: {}\n",
                preview(&record.response_text, self.preview_chars)
            ));
            if let Some(tag) = record.tag {
                out.push_str(&format!("  Tool used: {}\n", tag));
            }
            out.push('\n');
        }
        out
    }

    /// Whether `text` continues the previous turn, either through a
    /// reference word or by sharing a topic with it.
    ///
    /// Reference words ("it", "that", "also", ...) count only as whole words,
    /// so "write" or "item" do not make a message a follow-up. Multi-word
    /// phrases ("tell me more", "how about") match anywhere in the text.
    pub fn is_follow_up(&self, text: &str) -> bool {
        let Some(last) = self.records.back() else {
            return false;
        };
        let lower = text.to_lowercase();
        if FOLLOW_UP_WORDS.is_match(&lower) || FOLLOW_UP_PHRASES.iter().any(|p| lower.contains(p)) {
            return true;
        }
        !TopicExtractor::topics(&lower).is_disjoint(&last.topics)
    }

    /// Drop every interaction and the topic accumulator.
    pub fn clear(&mut self) {
        self.records.clear();
        self.topics.clear();
        self.total = 0;
    }

    pub fn summary(&self) -> String {
        let topics = if self.topics.is_empty() {
            "None yet".to_string()
        } else {
            self.topics.iter().copied().collect::<Vec<_>>().join(", ")
        };
        format!(
            "Conversation summary\nTotal interactions: {}\nRecent topics: {}\nMemory usage: {}/{} exchanges stored",
            self.total,
            topics,
            self.records.len(),
            self.capacity
        )
    }

    /// Stored interactions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Interaction> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&Interaction> {
        self.records.back()
    }

    pub fn current_topics(&self) -> &TopicSet {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}{}", cut, TRUNCATION_MARKER)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::Capability;

    fn weather_tag() -> Option<TurnTag> {
        Some(TurnTag::Capability(Capability::Weather))
    }

    // =========================================================================
    // Capacity
    // =========================================================================

    #[test]
    fn test_fifo_eviction() {
        let mut memory = ConversationMemory::new(3);
        for i in 1..=5 {
            memory.add_interaction(&format!("question {}", i), "answer", None);
        }
        assert_eq!(memory.len(), 3);
        let kept: Vec<_> = memory.history().map(|r| r.user_text.as_str()).collect();
        assert_eq!(kept, vec!["question 3", "question 4", "question 5"]);
        assert_eq!(memory.last().unwrap().seq, 5);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut memory = ConversationMemory::new(0);
        assert_eq!(memory.capacity(), 1);
        memory.add_interaction("a", "b", None);
        memory.add_interaction("c", "d", None);
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.last().unwrap().user_text, "c");
    }

    #[test]
    fn test_record_fields() {
        let mut memory = ConversationMemory::default();
        let record = memory
            .add_interaction("weather in Paris", "Sunny and 21 C", weather_tag())
            .clone();
        assert_eq!(record.seq, 1);
        assert!(record.timestamp > 0);
        assert_eq!(record.tag, weather_tag());
        assert!(record.topics.contains("weather"));
    }

    // =========================================================================
    // Context
    // =========================================================================

    #[test]
    fn test_context_empty() {
        assert_eq!(ConversationMemory::default().get_context(), NO_HISTORY);
    }

    #[test]
    fn test_context_window_and_truncation() {
        let mut memory = ConversationMemory::default();
        for i in 1..=4 {
            memory.add_interaction(&format!("q{}", i), &"x".repeat(200), weather_tag());
        }
        let context = memory.get_context();
        assert!(context.starts_with("Conversation history:\nExchange 1:\n  User: q2\n"));
        assert!(!context.contains("q1"));
        assert!(context.contains("Exchange 3:\n  User: q4\n"));
        assert!(context.contains(&format!("  Assistant: {}...\n", "x".repeat(150))));
        assert!(context.contains("  Tool used: weather\n"));
    }

    #[test]
    fn test_context_short_response_not_marked() {
        let mut memory = ConversationMemory::default();
        memory.add_interaction("hi", "hello there", None);
        let context = memory.context(3);
        assert!(context.contains("  Assistant: hello there\n"));
        assert!(!context.contains("Tool used"));
    }

    // =========================================================================
    // Follow-up detection
    // =========================================================================

    #[test]
    fn test_follow_up_false_when_empty() {
        assert!(!ConversationMemory::default().is_follow_up("tell me more about it"));
    }

    #[test]
    fn test_follow_up_pronoun() {
        let mut memory = ConversationMemory::default();
        memory.add_interaction("What is AI?", "AI is the study of intelligent agents.", None);
        assert!(memory.is_follow_up("Where is it used?"));
    }

    #[test]
    fn test_follow_up_phrase() {
        let mut memory = ConversationMemory::default();
        memory.add_interaction("weather in Paris", "Sunny", weather_tag());
        assert!(memory.is_follow_up("How about Rome?"));
    }

    #[test]
    fn test_follow_up_topic_overlap() {
        let mut memory = ConversationMemory::default();
        memory.add_interaction("weather in Paris", "Sunny", weather_tag());
        assert!(memory.is_follow_up("temperature in Rome"));
    }

    #[test]
    fn test_follow_up_words_need_word_boundaries() {
        let mut memory = ConversationMemory::default();
        memory.add_interaction("What is AI?", "AI is the study of intelligent agents.", None);
        assert!(!memory.is_follow_up("Write a poem"));
        assert!(!memory.is_follow_up("Bake a thatched pie"));
        assert!(memory.is_follow_up("Is THAT true?"));
    }

    #[test]
    fn test_not_follow_up() {
        let mut memory = ConversationMemory::default();
        memory.add_interaction("weather in Paris", "Sunny", weather_tag());
        assert!(!memory.is_follow_up("Who wrote Hamlet?"));
    }

    // =========================================================================
    // Clear & summary
    // =========================================================================

    #[test]
    fn test_clear_is_idempotent() {
        let mut memory = ConversationMemory::default();
        memory.add_interaction("latest news", "headlines", None);
        memory.clear();
        memory.clear();
        assert!(memory.is_empty());
        assert!(memory.current_topics().is_empty());
        assert_eq!(memory.get_context(), NO_HISTORY);
    }

    #[test]
    fn test_summary() {
        let mut memory = ConversationMemory::new(5);
        assert!(memory.summary().contains("Recent topics: None yet"));
        memory.add_interaction("latest news", "headlines", None);
        memory.add_interaction("weather in Paris", "Sunny", weather_tag());
        let summary = memory.summary();
        assert!(summary.contains("Total interactions: 2"));
        assert!(summary.contains("Recent topics: news, weather"));
        assert!(summary.contains("Memory usage: 2/5 exchanges stored"));
    }

    #[test]
    fn test_topics_accumulate_past_eviction() {
        let mut memory = ConversationMemory::new(1);
        memory.add_interaction("latest news", "headlines", None);
        memory.add_interaction("weather in Paris", "Sunny", weather_tag());
        assert!(memory.current_topics().contains("news"));
        assert!(memory.current_topics().contains("weather"));
    }
}
