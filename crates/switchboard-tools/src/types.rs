use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use switchboard_core::Capability;

// =============================================================================
// Arguments
// =============================================================================

/// Which headlines a news turn asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsScope {
    /// Country key from the extractor table (`india`, `usa`, ...).
    Country(String),
    /// Global breaking headlines.
    Breaking,
    /// World / international headlines.
    World,
}

/// Kind of email inferred from the request wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    BirthdayInvitation,
    ProfessionalMeeting,
    ThankYou,
    Complaint,
    JobApplication,
    Casual,
    General,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::BirthdayInvitation => "birthday_invitation",
            EmailKind::ProfessionalMeeting => "professional_meeting",
            EmailKind::ThankYou => "thank_you",
            EmailKind::Complaint => "complaint",
            EmailKind::JobApplication => "job_application",
            EmailKind::Casual => "casual",
            EmailKind::General => "general",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmailKind::BirthdayInvitation => "Birthday Invitation",
            EmailKind::ProfessionalMeeting => "Professional Meeting Request",
            EmailKind::ThankYou => "Thank You Email",
            EmailKind::Complaint => "Complaint Email",
            EmailKind::JobApplication => "Job Application",
            EmailKind::Casual => "Casual Message",
            EmailKind::General => "General Email",
        }
    }
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "birthday_invitation" => Ok(EmailKind::BirthdayInvitation),
            "professional_meeting" => Ok(EmailKind::ProfessionalMeeting),
            "thank_you" => Ok(EmailKind::ThankYou),
            "complaint" => Ok(EmailKind::Complaint),
            "job_application" => Ok(EmailKind::JobApplication),
            "casual" => Ok(EmailKind::Casual),
            "general" => Ok(EmailKind::General),
            _ => Err(format!("Unknown email kind: {}", s)),
        }
    }
}

/// Everything the email tool needs to compose and send one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRequest {
    pub recipient: Option<String>,
    pub kind: EmailKind,
    pub date: Option<String>,
    pub time: Option<String>,
    /// Request text with the request phrasing and addresses removed.
    pub content: String,
    /// Summary of the session's current document, appended to the body.
    pub attachment_summary: Option<String>,
}

/// Where the PDF tool gets its text from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentInput {
    /// Raw PDF bytes uploaded this turn.
    Upload(Vec<u8>),
    /// Text already extracted on an earlier turn.
    Extracted { text: String, page_count: usize },
    /// No document available.
    Missing,
}

/// What the image tool should do with the picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageMode {
    /// Vision-model description, OCR as fallback.
    Describe,
    /// Literal text via OCR only.
    ReadText,
}

/// Typed arguments for one tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArgs {
    Weather {
        location: String,
    },
    Time {
        location: String,
    },
    News {
        scope: NewsScope,
    },
    Calculator {
        expression: String,
    },
    UnitConversion {
        value: String,
        from_unit: String,
        to_unit: String,
    },
    Email(EmailRequest),
    Document {
        input: DocumentInput,
        prompt: String,
    },
    Image {
        image: Option<Vec<u8>>,
        prompt: String,
        mode: ImageMode,
    },
    Conversation {
        message: String,
        context: String,
        follow_up: bool,
        code_request: bool,
    },
}

impl ToolArgs {
    /// Capability whose handler accepts these arguments.
    pub fn capability(&self) -> Capability {
        match self {
            ToolArgs::Weather { .. } => Capability::Weather,
            ToolArgs::Time { .. } => Capability::Time,
            ToolArgs::News { .. } => Capability::NewsSearch,
            ToolArgs::Calculator { .. } => Capability::Calculator,
            ToolArgs::UnitConversion { .. } => Capability::UnitConverter,
            ToolArgs::Email(_) => Capability::Email,
            ToolArgs::Document { .. } => Capability::PdfAnalysis,
            ToolArgs::Image { .. } => Capability::Ocr,
            ToolArgs::Conversation { .. } => Capability::Conversation,
        }
    }

    /// Variant name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolArgs::Weather { .. } => "weather",
            ToolArgs::Time { .. } => "time",
            ToolArgs::News { .. } => "news",
            ToolArgs::Calculator { .. } => "calculator",
            ToolArgs::UnitConversion { .. } => "unit_conversion",
            ToolArgs::Email(_) => "email",
            ToolArgs::Document { .. } => "document",
            ToolArgs::Image { .. } => "image",
            ToolArgs::Conversation { .. } => "conversation",
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Degradation paths a handler can take instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    /// Vision model failed; literal OCR text returned instead of a description.
    VisionToOcr,
    /// Text model failed; static capability overview returned.
    CapabilityList,
    /// Text model failed; locally generated document report returned.
    LocalDocumentReport,
}

/// Structured record that a fallback replaced the requested answer type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackNotice {
    pub kind: FallbackKind,
    /// Why the primary path failed.
    pub reason: String,
}

/// Extracted document kept on the session for later turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDigest {
    pub text: String,
    pub summary: String,
    pub page_count: usize,
}

/// Successful handler result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ToolOutput {
    pub text: String,
    pub fallback: Option<FallbackNotice>,
    #[serde(skip)]
    pub digest: Option<DocumentDigest>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fallback: None,
            digest: None,
        }
    }

    pub fn with_fallback(mut self, kind: FallbackKind, reason: impl Into<String>) -> Self {
        self.fallback = Some(FallbackNotice {
            kind,
            reason: reason.into(),
        });
        self
    }

    pub fn with_digest(mut self, digest: DocumentDigest) -> Self {
        self.digest = Some(digest);
        self
    }
}
