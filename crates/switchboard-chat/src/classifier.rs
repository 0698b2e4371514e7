//! Rule-based intent classification.
//!
//! Rules are evaluated in the order of [`RULES`]; the first match decides
//! the capability and nothing after it is looked at. Categories overlap
//! (an email request can mention the weather), so the order is the
//! behaviour: keep it in sync with [`Capability::ALL`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use switchboard_core::Capability;
use switchboard_tools::handler::conversation::language_in;

// =============================================================================
// Compiled patterns
// =============================================================================

/// Address pattern shared with the parameter extractor.
pub(crate) static EMAIL_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("Invalid email regex")
});

struct IntentPatterns {
    ocr: Vec<Regex>,
    news_country: Regex,
    weather_keyword: Regex,
    temperature_unit: Regex,
    conversion: Regex,
    math_only: Regex,
    arithmetic_verb: Vec<Regex>,
    time: Regex,
    convert: Regex,
    unit_pair: Regex,
}

const UNIT_NAMES: &str = r"km|kms|kilometers?|kilometres?|miles?|mi|meters?|metres?|m|feet|foot|ft|kg|kgs|kilograms?|pounds?|lbs?|grams?|g|ounces?|oz|celsius|fahrenheit|kelvin";

fn one(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid intent regex")
}

static INTENT_PATTERNS: LazyLock<IntentPatterns> = LazyLock::new(|| {
    let mk = |pats: &[&str]| -> Vec<Regex> { pats.iter().map(|p| one(p)).collect() };

    IntentPatterns {
        // Narrow on purpose: a casual "text" must not steal the turn
        ocr: mk(&[
            r"(?i)\b(?:extract|read|scan|copy|get)\s+(?:the\s+|all\s+(?:the\s+)?|any\s+)?text\b",
            r"(?i)\bocr\b",
            r"(?i)\btext\s+(?:from|in|on)\s+(?:the\s+|this\s+|that\s+|my\s+)?(?:image|picture|photo|screenshot|scan)\b",
        ]),
        news_country: one(
            r"(?i)\b(?:india|indian|us|usa|uk|canada|australia|germany|france|japan|world|international)\s+news\b",
        ),
        weather_keyword: one(r"(?i)\b(?:weather|temperature|forecast|humid|humidity|wind|windy|rain|raining)\b"),
        temperature_unit: one(r"(?i)\b(?:degrees?|celsius|celcius|fahrenheit)\b"),
        conversion: one(
            r"(?i)\bconvert\b|\b(?:celsius|celcius|fahrenheit|kelvin)\s+(?:to|in|into)\b|\bto\s+(?:degrees\s+)?(?:celsius|celcius|fahrenheit|kelvin)\b",
        ),
        math_only: one(r"^[\d+\-*/().\s]+$"),
        arithmetic_verb: mk(&[
            r"(?i)\b(?:calculate|compute|evaluate|solve)\s*[-(]?\s*\d",
            r"(?i)\bwhat\s+is\s+\(?-?\d+(?:\.\d+)?\s*[-+*/]\s*\(?-?\d",
        ]),
        time: one(r"(?i)\btime\b"),
        convert: one(r"(?i)\bconvert\b"),
        unit_pair: one(&format!(r"(?i)\b(?:{u})\s+(?:to|into|in)\s+(?:{u})\b", u = UNIT_NAMES)),
    }
});

const EMAIL_PHRASES: &[&str] = &[
    "send email",
    "send mail",
    "send an email",
    "send a mail",
    "compose email",
    "write email",
    "email to",
    "mail to",
    "write a mail",
    "write an email",
    "sent a mail",
    "sent an email",
    "invite",
    "invitation",
];

const PDF_KEYWORDS: &[&str] = &[
    "pdf",
    "document",
    "read pdf",
    "analyze pdf",
    "pdf summary",
    "extract from pdf",
    "pdf main points",
    "summarize pdf",
];

const NEWS_KEYWORDS: &[&str] = &[
    "news",
    "headlines",
    "breaking",
    "current events",
    "latest update",
    "today news",
    "recent news",
    "what's happening",
    "current affairs",
    "top stories",
    "news update",
    "live news",
];

const WEATHER_PHRASES: &[&str] = &[
    "what is the weather",
    "what's the weather",
    "current weather",
    "how is the weather",
    "weather like",
    "weather in",
    "weather at",
    "temperature in",
    "temperature at",
    "how hot",
    "how cold",
];

const CODE_KEYWORDS: &[&str] = &[
    "code",
    "program",
    "programming",
    "function",
    "algorithm",
    "script",
    "syntax",
    "snippet",
    "implement",
    "example code",
    "write a program",
    "switch case",
    "for loop",
    "while loop",
    "if else",
    "class",
];

// =============================================================================
// Rule table
// =============================================================================

/// Input prepared once per classification.
struct TurnInput<'a> {
    raw: &'a str,
    lower: String,
}

impl TurnInput<'_> {
    fn contains_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.lower.contains(n))
    }
}

/// One `(predicate, capability)` pair in the cascade.
pub struct Rule {
    pub capability: Capability,
    pub name: &'static str,
    matches: fn(&TurnInput) -> bool,
}

/// The cascade, in priority order.
static RULES: &[Rule] = &[
    Rule {
        capability: Capability::Email,
        name: "email_address",
        matches: |p| EMAIL_ADDRESS.is_match(p.raw),
    },
    Rule {
        capability: Capability::Email,
        name: "email_phrase",
        matches: |p| p.contains_any(EMAIL_PHRASES),
    },
    Rule {
        capability: Capability::PdfAnalysis,
        name: "pdf_keyword",
        matches: |p| p.contains_any(PDF_KEYWORDS),
    },
    Rule {
        capability: Capability::Ocr,
        name: "ocr_phrase",
        matches: |p| INTENT_PATTERNS.ocr.iter().any(|re| re.is_match(p.raw)),
    },
    Rule {
        capability: Capability::NewsSearch,
        name: "news_country",
        matches: |p| INTENT_PATTERNS.news_country.is_match(p.raw),
    },
    Rule {
        capability: Capability::NewsSearch,
        name: "news_breaking",
        matches: |p| p.lower.contains("breaking") && p.lower.contains("news"),
    },
    Rule {
        capability: Capability::NewsSearch,
        name: "news_keyword",
        matches: |p| p.contains_any(NEWS_KEYWORDS),
    },
    Rule {
        capability: Capability::Weather,
        name: "weather_phrase",
        matches: |p| p.contains_any(WEATHER_PHRASES),
    },
    Rule {
        capability: Capability::Weather,
        name: "weather_keyword",
        matches: |p| INTENT_PATTERNS.weather_keyword.is_match(p.raw),
    },
    Rule {
        capability: Capability::Weather,
        name: "temperature_unit",
        // "convert 10 celsius to fahrenheit" is a conversion, not a forecast
        matches: |p| {
            INTENT_PATTERNS.temperature_unit.is_match(p.raw)
                && !INTENT_PATTERNS.conversion.is_match(p.raw)
        },
    },
    Rule {
        capability: Capability::Calculator,
        name: "math_only",
        matches: |p| {
            INTENT_PATTERNS.math_only.is_match(p.raw) && p.raw.chars().any(|c| c.is_ascii_digit())
        },
    },
    Rule {
        capability: Capability::Calculator,
        name: "arithmetic_verb",
        matches: |p| INTENT_PATTERNS.arithmetic_verb.iter().any(|re| re.is_match(p.raw)),
    },
    Rule {
        capability: Capability::Time,
        name: "time_keyword",
        matches: |p| INTENT_PATTERNS.time.is_match(p.raw),
    },
    Rule {
        capability: Capability::UnitConverter,
        name: "convert_keyword",
        matches: |p| INTENT_PATTERNS.convert.is_match(p.raw),
    },
    Rule {
        capability: Capability::UnitConverter,
        name: "unit_pair",
        matches: |p| INTENT_PATTERNS.unit_pair.is_match(p.raw),
    },
];

/// Rule name reported when nothing matched and the turn goes to the model.
pub const DEFAULT_RULE: &str = "default";

/// Outcome of a traced classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub capability: Capability,
    pub rule: &'static str,
}

// =============================================================================
// Classifier
// =============================================================================

/// Ordered, first-match-wins intent classifier. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Capability for `text`, or `None` for blank input.
    pub fn classify(&self, text: &str) -> Option<Capability> {
        self.classify_with_trace(text).map(|c| c.capability)
    }

    /// Like [`classify`](Self::classify), also naming the rule that fired.
    pub fn classify_with_trace(&self, text: &str) -> Option<Classification> {
        if text.trim().is_empty() {
            return None;
        }
        let input = TurnInput {
            raw: text,
            lower: text.to_lowercase(),
        };
        let hit = RULES
            .iter()
            .find(|rule| (rule.matches)(&input))
            .map(|rule| Classification {
                capability: rule.capability,
                rule: rule.name,
            })
            .unwrap_or(Classification {
                capability: Capability::Conversation,
                rule: DEFAULT_RULE,
            });
        Some(hit)
    }

    /// Whether a conversation turn asks for code.
    pub fn is_code_request(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        CODE_KEYWORDS.iter().any(|k| lower.contains(k)) || language_in(text).is_some()
    }

    /// The rule table, in evaluation order.
    pub fn rules(&self) -> &'static [Rule] {
        RULES
    }
}
