//! Reply templating around tool output.

use switchboard_core::Capability;
use switchboard_tools::CAPABILITY_OVERVIEW;

/// Placeholder stored as the user text of a PDF-only turn.
pub const PDF_UPLOAD_PLACEHOLDER: &str = "[File Upload] (PDF)";
/// Placeholder stored as the user text of an image-only turn.
pub const IMAGE_UPLOAD_PLACEHOLDER: &str = "[File Upload] (Image)";

const FOLLOW_UP_GREETING: &str =
    "I'm still here. Ask me something else, upload a file, or type /summary to see what we've covered.";

/// Reply to an empty message.
pub fn greeting(has_history: bool) -> String {
    if has_history {
        FOLLOW_UP_GREETING.to_string()
    } else {
        format!("Hello! {}", CAPABILITY_OVERVIEW)
    }
}

/// Heading placed above successful output of the quick-lookup tools.
pub fn banner(capability: Capability) -> Option<&'static str> {
    match capability {
        Capability::Weather => Some("Weather Information"),
        Capability::NewsSearch => Some("Live News Update"),
        Capability::Calculator => Some("Calculation Result"),
        Capability::Time => Some("Current Time"),
        Capability::UnitConverter => Some("Unit Conversion"),
        _ => None,
    }
}

/// Final reply text for a successful tool call.
pub fn contextual_response(capability: Capability, tool_text: &str) -> String {
    match banner(capability) {
        Some(heading) => format!("{}\n\n{}", heading, tool_text),
        None => tool_text.to_string(),
    }
}

/// Reply for a PDF upload that also sent an email.
pub fn combine_pdf_and_email(analysis: &str, email: &str) -> String {
    format!("{}\n\n---\n\n{}", analysis, email)
}
