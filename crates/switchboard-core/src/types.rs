use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::SwitchboardError;

// =============================================================================
// Capability
// =============================================================================

/// The closed set of message-handling behaviours.
///
/// Every variant has both a classifier predicate and an extractor branch in
/// `switchboard-chat`; adding one means adding both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Email,
    PdfAnalysis,
    Ocr,
    NewsSearch,
    Weather,
    Calculator,
    Time,
    UnitConverter,
    Conversation,
}

impl Capability {
    /// All capabilities in classifier priority order.
    pub const ALL: [Capability; 9] = [
        Capability::Email,
        Capability::PdfAnalysis,
        Capability::Ocr,
        Capability::NewsSearch,
        Capability::Weather,
        Capability::Calculator,
        Capability::Time,
        Capability::UnitConverter,
        Capability::Conversation,
    ];

    /// Snake-case tag used in logs and stored interactions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Email => "email",
            Capability::PdfAnalysis => "pdf_analysis",
            Capability::Ocr => "ocr",
            Capability::NewsSearch => "news_search",
            Capability::Weather => "weather",
            Capability::Calculator => "calculator",
            Capability::Time => "time",
            Capability::UnitConverter => "unit_converter",
            Capability::Conversation => "conversation",
        }
    }

    /// Human-readable name used in response banners and error strings.
    pub fn label(&self) -> &'static str {
        match self {
            Capability::Email => "Email",
            Capability::PdfAnalysis => "PDF analysis",
            Capability::Ocr => "Text extraction",
            Capability::NewsSearch => "News",
            Capability::Weather => "Weather",
            Capability::Calculator => "Calculator",
            Capability::Time => "Time",
            Capability::UnitConverter => "Unit conversion",
            Capability::Conversation => "Conversation",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown capability: {}", s))
    }
}

// =============================================================================
// TurnTag
// =============================================================================

/// Tag stored on every interaction record.
///
/// Either a classifier capability or one of the fixed sentinels for turns
/// that never went through the classifier (attachments, greetings) or that
/// failed at the dispatch boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TurnTag {
    Capability(Capability),
    ImageAnalysis,
    PdfEmail,
    Greeting,
    Error,
}

impl TurnTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnTag::Capability(c) => c.as_str(),
            TurnTag::ImageAnalysis => "image_analysis",
            TurnTag::PdfEmail => "pdf_email",
            TurnTag::Greeting => "greeting",
            TurnTag::Error => "error",
        }
    }
}

impl From<Capability> for TurnTag {
    fn from(c: Capability) -> Self {
        TurnTag::Capability(c)
    }
}

impl fmt::Display for TurnTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TurnTag {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image_analysis" => Ok(TurnTag::ImageAnalysis),
            "pdf_email" => Ok(TurnTag::PdfEmail),
            "greeting" => Ok(TurnTag::Greeting),
            "error" => Ok(TurnTag::Error),
            other => other
                .parse::<Capability>()
                .map(TurnTag::Capability)
                .map_err(|_| format!("Unknown turn tag: {}", other)),
        }
    }
}

impl From<TurnTag> for String {
    fn from(tag: TurnTag) -> Self {
        tag.as_str().to_string()
    }
}

impl TryFrom<String> for TurnTag {
    type Error = String;
    fn try_from(s: String) -> Result<Self, String> {
        s.parse()
    }
}

// =============================================================================
// Message & attachments
// =============================================================================

/// Binary payload riding along with a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Image(Vec<u8>),
    Document(Vec<u8>),
}

/// Kind selector used when decoding an encoded attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Document,
}

impl Attachment {
    /// Decode a base64 payload, optionally wrapped in a `data:` URL
    /// (`data:application/pdf;base64,...`).
    pub fn from_encoded(kind: AttachmentKind, encoded: &str) -> Result<Self, SwitchboardError> {
        let payload = match encoded.split_once(',') {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => encoded,
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| SwitchboardError::InvalidAttachment(e.to_string()))?;
        if bytes.is_empty() {
            return Err(SwitchboardError::InvalidAttachment(
                "attachment is empty".to_string(),
            ));
        }
        Ok(match kind {
            AttachmentKind::Image => Attachment::Image(bytes),
            AttachmentKind::Document => Attachment::Document(bytes),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Attachment::Image(b) | Attachment::Document(b) => b,
        }
    }
}

/// One incoming user turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Raw user text; may be empty when only a file was sent.
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(text: impl Into<String>, attachment: Attachment) -> Self {
        Self {
            text: text.into(),
            attachment: Some(attachment),
        }
    }

    /// True when the text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
