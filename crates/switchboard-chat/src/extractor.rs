//! Free text to typed tool arguments.
//!
//! Extraction is total: every branch falls back to a documented default
//! instead of failing, and anything still wrong is reported by the tool.

use std::sync::LazyLock;

use regex::Regex;

use switchboard_core::{Capability, SwitchboardConfig};
use switchboard_tools::{
    DocumentInput, EmailKind, EmailRequest, ImageMode, NewsScope, ToolArgs,
};

use crate::classifier::{IntentClassifier, EMAIL_ADDRESS};

/// Location used for time lookups when none is named.
pub const LOCAL_TIME: &str = "local";

const DEFAULT_UNIT_VALUE: &str = "1";
const DEFAULT_FROM_UNIT: &str = "celsius";
const DEFAULT_TO_UNIT: &str = "fahrenheit";

// =============================================================================
// Compiled patterns
// =============================================================================

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid extractor regex")
}

const MONTHS: &str = "january|jan|february|feb|march|mar|april|apr|may|june|jun|july|jul|august|aug|september|sept|sep|october|oct|november|nov|december|dec";

struct LocationPatterns {
    weather: Regex,
    time: Regex,
    trailing_filler: Regex,
}

static LOCATION: LazyLock<LocationPatterns> = LazyLock::new(|| LocationPatterns {
    // Up to three filler words: "weather like in London"
    weather: re(r"(?i)\b(?:weather|temperature|forecast|humidity)\b(?:\s+[\w']+){0,3}?\s+(?:in|for|at)\s+(.+)"),
    time: re(r"(?i)\btime\b(?:\s+[\w']+){0,3}?\s+(?:in|for|at)\s+(.+)"),
    trailing_filler: re(r"(?i)\s+(?:today|tonight|tomorrow|now|right\s+now|currently|please)$"),
});

/// Country keys understood by the news service, with their synonyms.
static NEWS_COUNTRIES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        ("india", re(r"(?i)\b(?:india|indian)\b")),
        // Bare "us" only in capitals, so "tell us the news" stays generic
        ("usa", re(r"(?i:\b(?:usa|u\.s\.a|united\s+states|america|american)\b)|\bUS\b")),
        ("uk", re(r"(?i)\b(?:uk|u\.k|united\s+kingdom|britain|british|england)\b")),
        ("canada", re(r"(?i)\b(?:canada|canadian)\b")),
        ("australia", re(r"(?i)\b(?:australia|australian)\b")),
        ("germany", re(r"(?i)\b(?:germany|german)\b")),
        ("france", re(r"(?i)\b(?:france|french)\b")),
        ("japan", re(r"(?i)\b(?:japan|japanese)\b")),
    ]
});

static BREAKING: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bbreaking\b"));
static WORLD: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\b(?:world|international|global)\b"));

/// Same character set the calculator admits.
static ARITHMETIC_RUN: LazyLock<Regex> = LazyLock::new(|| re(r"[\d+\-*/(). ]+"));

struct UnitPatterns {
    split: Regex,
    /// "in" only separates the units when no "to"/"into" does.
    split_in: Regex,
    leading_verb: Regex,
    value: Regex,
    degrees: Regex,
}

static UNITS: LazyLock<UnitPatterns> = LazyLock::new(|| UnitPatterns {
    split: re(r"(?i)\s+(?:to|into)\s+"),
    split_in: re(r"(?i)\s+in\s+"),
    leading_verb: re(r"(?i)^(?:please\s+)?(?:convert|change|what\s+is|what's|how\s+much\s+is|how\s+many)\s+"),
    value: re(r"^(-?\d+(?:\.\d+)?)\s*(.*)$"),
    degrees: re(r"(?i)^degrees?\s+"),
});

struct EmailPatterns {
    dates: Vec<Regex>,
    clock: Regex,
    oclock: Regex,
    request: Regex,
    leading_connector: Regex,
    kinds: Vec<(EmailKind, Regex)>,
}

static EMAIL: LazyLock<EmailPatterns> = LazyLock::new(|| EmailPatterns {
    dates: vec![
        re(&format!(
            r"(?i)\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:{m})\.?,?\s+\d{{4}}\b",
            m = MONTHS
        )),
        re(&format!(
            r"(?i)\b(?:{m})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}\b",
            m = MONTHS
        )),
        re(r"\b\d{1,2}[-/]\d{1,2}[-/]\d{4}\b"),
    ],
    clock: re(r"(?i)\b(\d{1,2}(?::\d{2})?)\s*([ap])\.?m\b\.?"),
    oclock: re(r"(?i)\b\d{1,2}\s*o'?\s*clock\b(?:\s+(?:in\s+the\s+)?(?:noon|morning|afternoon|evening|night))?"),
    request: re(
        r"(?i)\b(?:please\s+)?(?:send|write|compose|draft)\s+(?:an?\s+)?(?:e-?mail|mail|message)(?:\s+to\b)?|\b(?:e-?mail|mail)\s+to\b",
    ),
    leading_connector: re(r"(?i)^(?:to|about|regarding|saying|that|for)\b[\s:,-]*"),
    kinds: vec![
        (
            EmailKind::BirthdayInvitation,
            re(r"(?i)\b(?:birthday|party|celebrat\w*|invite\w*|invitation)\b"),
        ),
        (
            EmailKind::ProfessionalMeeting,
            re(r"(?i)\b(?:meet|meeting|hod|professor|sir|madam|discuss\w*|appointment)\b"),
        ),
        (
            EmailKind::ThankYou,
            re(r"(?i)\b(?:thank\w*|grateful|appreciat\w*)\b"),
        ),
        (
            EmailKind::Complaint,
            re(r"(?i)\b(?:complain\w*|complaint|issue|problem)\b"),
        ),
        (
            EmailKind::JobApplication,
            re(r"(?i)\b(?:job|application|resume|cv|hire|hiring)\b"),
        ),
        (
            EmailKind::Casual,
            re(r"(?i)\b(?:casual|friend|hi|hello|hey|catch\s+up)\b"),
        ),
    ],
});

// =============================================================================
// Helpers
// =============================================================================

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Captured location, cut at the first sentence break and stripped of
/// trailing time words.
fn clean_location(raw: &str) -> Option<String> {
    let cut = raw
        .split(|c: char| matches!(c, '?' | '!' | '.' | ',' | ';' | '\n'))
        .next()
        .unwrap_or("");
    let mut location = cut.trim().to_string();
    while let Some(m) = LOCATION.trailing_filler.find(&location) {
        location.truncate(m.start());
    }
    let location = location.trim_matches(|c: char| !c.is_alphanumeric());
    if location.is_empty() {
        None
    } else {
        Some(title_case(location))
    }
}

// =============================================================================
// ParameterExtractor
// =============================================================================

/// Turns a classified message into [`ToolArgs`]. Stateless and shareable.
#[derive(Debug, Clone)]
pub struct ParameterExtractor {
    default_location: String,
    default_country: String,
    classifier: IntentClassifier,
}

impl Default for ParameterExtractor {
    fn default() -> Self {
        Self::new("New Delhi", "india")
    }
}

impl ParameterExtractor {
    pub fn new(default_location: impl Into<String>, default_country: impl Into<String>) -> Self {
        Self {
            default_location: default_location.into(),
            default_country: default_country.into(),
            classifier: IntentClassifier::new(),
        }
    }

    pub fn from_config(config: &SwitchboardConfig) -> Self {
        Self::new(
            config.weather.default_location.clone(),
            config.news.default_country.clone(),
        )
    }

    /// Arguments for `capability`. Never fails.
    ///
    /// Document, image and conversation arguments carry no session state
    /// here; the engine fills in attachments and memory context.
    pub fn extract(&self, capability: Capability, text: &str) -> ToolArgs {
        match capability {
            Capability::Weather => ToolArgs::Weather {
                location: self
                    .weather_location(text)
                    .unwrap_or_else(|| self.default_location.clone()),
            },
            Capability::Time => ToolArgs::Time {
                location: self.time_location(text).unwrap_or_else(|| LOCAL_TIME.to_string()),
            },
            Capability::NewsSearch => ToolArgs::News {
                scope: self.news_scope(text),
            },
            Capability::Calculator => ToolArgs::Calculator {
                expression: self.expression(text),
            },
            Capability::UnitConverter => self.unit_conversion(text),
            Capability::Email => ToolArgs::Email(self.email_request(text)),
            Capability::PdfAnalysis => ToolArgs::Document {
                input: DocumentInput::Missing,
                prompt: text.trim().to_string(),
            },
            Capability::Ocr => ToolArgs::Image {
                image: None,
                prompt: text.trim().to_string(),
                mode: ImageMode::ReadText,
            },
            Capability::Conversation => ToolArgs::Conversation {
                message: text.trim().to_string(),
                context: String::new(),
                follow_up: false,
                code_request: self.classifier.is_code_request(text),
            },
        }
    }

    pub fn weather_location(&self, text: &str) -> Option<String> {
        LOCATION
            .weather
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| clean_location(m.as_str()))
    }

    pub fn time_location(&self, text: &str) -> Option<String> {
        LOCATION
            .time
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| clean_location(m.as_str()))
    }

    /// Named country first, then breaking, then world, then the default.
    pub fn news_scope(&self, text: &str) -> NewsScope {
        if let Some((country, _)) = NEWS_COUNTRIES.iter().find(|(_, re)| re.is_match(text)) {
            return NewsScope::Country(country.to_string());
        }
        if BREAKING.is_match(text) {
            return NewsScope::Breaking;
        }
        if WORLD.is_match(text) {
            return NewsScope::World;
        }
        NewsScope::Country(self.default_country.clone())
    }

    /// Longest arithmetic-looking run containing a digit, else the raw text.
    pub fn expression(&self, text: &str) -> String {
        let spaced = collapse_whitespace(text);
        let mut best = "";
        for m in ARITHMETIC_RUN.find_iter(&spaced) {
            let run = m.as_str().trim();
            if run.len() > best.len() && run.chars().any(|c| c.is_ascii_digit()) {
                best = run;
            }
        }
        if best.is_empty() {
            text.trim().to_string()
        } else {
            best.to_string()
        }
    }

    /// `"<value> <from> to <to>"`, defaulting to one degree Celsius in
    /// Fahrenheit when the message has no " to ".
    pub fn unit_conversion(&self, text: &str) -> ToolArgs {
        let default = || ToolArgs::UnitConversion {
            value: DEFAULT_UNIT_VALUE.to_string(),
            from_unit: DEFAULT_FROM_UNIT.to_string(),
            to_unit: DEFAULT_TO_UNIT.to_string(),
        };

        let lower = text.trim().to_lowercase();
        let split = if UNITS.split.is_match(&lower) {
            &UNITS.split
        } else {
            &UNITS.split_in
        };
        let mut parts = split.splitn(&lower, 2);
        let (Some(left), Some(right)) = (parts.next(), parts.next()) else {
            return default();
        };

        let left = UNITS.leading_verb.replace(left.trim(), "");
        let (value, from_unit) = match UNITS.value.captures(&left) {
            Some(caps) => (
                caps[1].to_string(),
                caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
            ),
            None => (DEFAULT_UNIT_VALUE.to_string(), left.trim().to_string()),
        };
        let from_unit = UNITS.degrees.replace(&from_unit, "").trim().to_string();

        let right = UNITS.degrees.replace(right.trim(), "");
        let to_unit = right
            .split_whitespace()
            .next()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .unwrap_or_default();

        if from_unit.is_empty() || to_unit.is_empty() {
            return default();
        }
        ToolArgs::UnitConversion {
            value,
            from_unit,
            to_unit,
        }
    }

    pub fn email_request(&self, text: &str) -> EmailRequest {
        EmailRequest {
            recipient: EMAIL_ADDRESS.find(text).map(|m| m.as_str().to_string()),
            kind: email_kind(text),
            date: email_date(text),
            time: email_time(text),
            content: email_content(text),
            attachment_summary: None,
        }
    }
}

pub fn email_kind(text: &str) -> EmailKind {
    EMAIL
        .kinds
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(kind, _)| *kind)
        .unwrap_or(EmailKind::General)
}

/// First date token, title-cased ("5 June 2025", "June 5, 2025", "05/06/2025").
pub fn email_date(text: &str) -> Option<String> {
    EMAIL
        .dates
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| title_case(m.as_str()))
}

/// First time token: "3 PM", "10:30 AM" or "5 o'clock".
pub fn email_time(text: &str) -> Option<String> {
    if let Some(caps) = EMAIL.clock.captures(text) {
        return Some(format!("{} {}M", &caps[1], caps[2].to_uppercase()));
    }
    EMAIL
        .oclock
        .find(text)
        .map(|m| collapse_whitespace(&m.as_str().to_lowercase()))
}

/// Message body with request phrasing and addresses removed.
pub fn email_content(text: &str) -> String {
    let without_request = EMAIL.request.replace_all(text, " ");
    let without_address = EMAIL_ADDRESS.replace_all(&without_request, " ");
    let mut content = collapse_whitespace(&without_address);
    loop {
        let stripped = EMAIL.leading_connector.replace(&content, "").trim().to_string();
        if stripped == content {
            break;
        }
        content = stripped;
    }
    content
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ':' | '-'))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ParameterExtractor {
        ParameterExtractor::default()
    }

    // =========================================================================
    // Locations
    // =========================================================================

    #[test]
    fn test_weather_location() {
        let args = extractor().extract(Capability::Weather, "weather in Paris");
        assert_eq!(args, ToolArgs::Weather { location: "Paris".into() });
    }

    #[test]
    fn test_weather_location_with_filler_words() {
        let ex = extractor();
        assert_eq!(
            ex.weather_location("what's the weather like in new york today?"),
            Some("New York".into())
        );
        assert_eq!(ex.weather_location("temperature for LONDON!"), Some("London".into()));
    }

    #[test]
    fn test_weather_default_location() {
        let args = extractor().extract(Capability::Weather, "how hot is it");
        assert_eq!(args, ToolArgs::Weather { location: "New Delhi".into() });

        let custom = ParameterExtractor::new("Oslo", "uk");
        assert_eq!(
            custom.extract(Capability::Weather, "weather please"),
            ToolArgs::Weather { location: "Oslo".into() }
        );
    }

    #[test]
    fn test_time_location() {
        let ex = extractor();
        assert_eq!(
            ex.extract(Capability::Time, "what time is it in Tokyo?"),
            ToolArgs::Time { location: "Tokyo".into() }
        );
        assert_eq!(
            ex.extract(Capability::Time, "current time"),
            ToolArgs::Time { location: LOCAL_TIME.into() }
        );
    }

    // =========================================================================
    // News
    // =========================================================================

    #[test]
    fn test_news_country() {
        let ex = extractor();
        assert_eq!(ex.news_scope("latest uk news"), NewsScope::Country("uk".into()));
        assert_eq!(
            ex.news_scope("what's happening in the United States"),
            NewsScope::Country("usa".into())
        );
        assert_eq!(ex.news_scope("US headlines"), NewsScope::Country("usa".into()));
    }

    #[test]
    fn test_news_us_pronoun_is_not_a_country() {
        assert_eq!(
            extractor().news_scope("tell us the news"),
            NewsScope::Country("india".into())
        );
    }

    #[test]
    fn test_news_breaking_and_world() {
        let ex = extractor();
        assert_eq!(ex.news_scope("breaking news"), NewsScope::Breaking);
        assert_eq!(ex.news_scope("international headlines"), NewsScope::World);
        assert_eq!(
            ex.news_scope("breaking news from japan"),
            NewsScope::Country("japan".into())
        );
    }

    // =========================================================================
    // Calculator
    // =========================================================================

    #[test]
    fn test_expression() {
        let ex = extractor();
        assert_eq!(ex.expression("calculate 15 * 20"), "15 * 20");
        assert_eq!(ex.expression("what is (2+3)*4?"), "(2+3)*4");
        assert_eq!(ex.expression("12 + 4"), "12 + 4");
    }

    #[test]
    fn test_expression_normalises_whitespace() {
        let ex = extractor();
        assert_eq!(ex.expression("calculate 15\t*\t20"), "15 * 20");
        assert_eq!(ex.expression("3\u{a0}+\n4"), "3 + 4");
    }

    #[test]
    fn test_expression_passes_raw_text_through() {
        assert_eq!(extractor().expression("calculate pi"), "calculate pi");
    }

    // =========================================================================
    // Units
    // =========================================================================

    fn units(value: &str, from: &str, to: &str) -> ToolArgs {
        ToolArgs::UnitConversion {
            value: value.into(),
            from_unit: from.into(),
            to_unit: to.into(),
        }
    }

    #[test]
    fn test_unit_conversion() {
        let ex = extractor();
        assert_eq!(ex.extract(Capability::UnitConverter, "10 km to miles"), units("10", "km", "miles"));
        assert_eq!(
            ex.extract(Capability::UnitConverter, "Convert 5.5 kilograms to pounds please"),
            units("5.5", "kilograms", "pounds")
        );
        assert_eq!(
            ex.extract(Capability::UnitConverter, "convert 100 degrees celsius to fahrenheit"),
            units("100", "celsius", "fahrenheit")
        );
    }

    #[test]
    fn test_unit_conversion_in_and_into() {
        let ex = extractor();
        assert_eq!(ex.extract(Capability::UnitConverter, "5 kg into pounds"), units("5", "kg", "pounds"));
        assert_eq!(ex.extract(Capability::UnitConverter, "100 km in miles"), units("100", "km", "miles"));
        assert_eq!(
            ex.extract(Capability::UnitConverter, "30 celsius in fahrenheit"),
            units("30", "celsius", "fahrenheit")
        );
    }

    #[test]
    fn test_unit_conversion_without_value() {
        assert_eq!(
            extractor().extract(Capability::UnitConverter, "convert miles to km"),
            units("1", "miles", "km")
        );
    }

    #[test]
    fn test_unit_conversion_default_triple() {
        assert_eq!(
            extractor().extract(Capability::UnitConverter, "convert something"),
            units("1", "celsius", "fahrenheit")
        );
    }

    // =========================================================================
    // Email
    // =========================================================================

    #[test]
    fn test_email_request() {
        let request = extractor().email_request(
            "send an email to bob@example.com about the project meeting on 5 June 2025 at 3pm",
        );
        assert_eq!(request.recipient.as_deref(), Some("bob@example.com"));
        assert_eq!(request.kind, EmailKind::ProfessionalMeeting);
        assert_eq!(request.date.as_deref(), Some("5 June 2025"));
        assert_eq!(request.time.as_deref(), Some("3 PM"));
        assert_eq!(request.content, "the project meeting on 5 June 2025 at 3pm");
        assert!(request.attachment_summary.is_none());
    }

    #[test]
    fn test_email_missing_fields_stay_empty() {
        let request = extractor().email_request("write an email saying hello");
        assert!(request.recipient.is_none());
        assert!(request.date.is_none());
        assert!(request.time.is_none());
        assert_eq!(request.kind, EmailKind::Casual);
        assert_eq!(request.content, "hello");
    }

    #[test]
    fn test_email_kinds() {
        assert_eq!(email_kind("invite them to my birthday party"), EmailKind::BirthdayInvitation);
        assert_eq!(email_kind("thanks for the help"), EmailKind::ThankYou);
        assert_eq!(email_kind("complain about the late delivery"), EmailKind::Complaint);
        assert_eq!(email_kind("apply for the job"), EmailKind::JobApplication);
        assert_eq!(email_kind("quarterly figures"), EmailKind::General);
        // "this" must not read as "hi"
        assert_eq!(email_kind("this week"), EmailKind::General);
    }

    #[test]
    fn test_email_dates_and_times() {
        assert_eq!(email_date("on june 5th, 2025 please").as_deref(), Some("June 5th, 2025"));
        assert_eq!(email_date("by 12/08/2025").as_deref(), Some("12/08/2025"));
        assert_eq!(email_time("at 10:30 am").as_deref(), Some("10:30 AM"));
        assert_eq!(email_time("at 5 o'clock in the evening").as_deref(), Some("5 o'clock in the evening"));
        assert_eq!(email_time("sometime soon"), None);
    }

    // =========================================================================
    // Pass-through capabilities
    // =========================================================================

    #[test]
    fn test_session_backed_args() {
        let ex = extractor();
        assert_eq!(
            ex.extract(Capability::PdfAnalysis, " summarize the pdf "),
            ToolArgs::Document {
                input: DocumentInput::Missing,
                prompt: "summarize the pdf".into()
            }
        );
        assert!(matches!(
            ex.extract(Capability::Ocr, "read the text"),
            ToolArgs::Image { image: None, mode: ImageMode::ReadText, .. }
        ));
        assert_eq!(
            ex.extract(Capability::Conversation, "write a python function"),
            ToolArgs::Conversation {
                message: "write a python function".into(),
                context: String::new(),
                follow_up: false,
                code_request: true,
            }
        );
    }
}
