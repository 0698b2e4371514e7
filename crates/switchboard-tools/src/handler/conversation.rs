//! Free-form conversation handler backed by the text model.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use switchboard_core::Capability;
use switchboard_llm::{CompletionOptions, CompletionService};

use crate::error::ToolError;
use crate::handler::{wrong_args, ToolHandler};
use crate::types::{FallbackKind, ToolArgs, ToolOutput};

/// Static overview of what the assistant can do.
pub const CAPABILITY_OVERVIEW: &str = "I'm your Switchboard assistant. I can help with:

- Weather: \"weather in London\"
- News: \"latest news in India\" or \"breaking news\"
- Calculations: \"calculate 15 * 20\"
- Time: \"what time is it in Tokyo\"
- Unit conversion: \"convert 10 km to miles\"
- Email: \"send an email to name@example.com about the meeting on 5 June 2025 at 3 PM\"
- PDF analysis: upload a PDF for a summary and key points
- Images: upload an image for a description, or ask me to read the text in it
- General questions and programming help";

/// Programming languages recognised in requests, lower-case.
pub const CODE_LANGUAGES: &[&str] = &[
    "python",
    "java",
    "javascript",
    "typescript",
    "c++",
    "c#",
    "php",
    "ruby",
    "golang",
    "rust",
    "swift",
    "kotlin",
    "html",
    "css",
    "sql",
    "bash",
];

const MAX_TOKENS: u32 = 800;
const CODE_TEMPERATURE: f32 = 0.3;

/// First programming language named in `text`.
pub fn language_in(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#'))
        .find_map(|w| CODE_LANGUAGES.iter().find(|lang| **lang == w).copied())
}

pub fn conversation_prompt(message: &str, context: &str, follow_up: bool) -> String {
    let mut prompt = String::from("You are a helpful, friendly assistant.\n");
    if !context.trim().is_empty() {
        prompt.push_str(&format!("\nRecent conversation:\n{}\n", context.trim_end()));
    }
    if follow_up {
        prompt.push_str(
            "\nThe current question follows up on the conversation above; resolve words like \"it\" or \"that\" from it.\n",
        );
    }
    prompt.push_str(&format!(
        "\nCurrent question: {}\n\nAnswer clearly and concisely.",
        message.trim()
    ));
    prompt
}

pub fn code_prompt(message: &str, context: &str) -> String {
    let language = language_in(message).unwrap_or("the most suitable language");
    let mut prompt = format!(
        "You are an expert programming assistant. Write clear, well-commented code in {} for the request below.\n\
         Put code in fenced code blocks, then briefly explain how it works.\n",
        language
    );
    if !context.trim().is_empty() {
        prompt.push_str(&format!("\nRecent conversation:\n{}\n", context.trim_end()));
    }
    prompt.push_str(&format!("\nRequest: {}", message.trim()));
    prompt
}

/// Handler for everything no specialised tool claims.
pub struct ConversationHandler {
    completion: Arc<dyn CompletionService>,
    chat_options: CompletionOptions,
    code_options: CompletionOptions,
}

impl ConversationHandler {
    pub fn new(completion: Arc<dyn CompletionService>, options: CompletionOptions) -> Self {
        Self {
            completion,
            chat_options: options.clone().with_max_tokens(MAX_TOKENS),
            code_options: options
                .with_max_tokens(MAX_TOKENS)
                .with_temperature(CODE_TEMPERATURE),
        }
    }
}

#[async_trait]
impl ToolHandler for ConversationHandler {
    fn capability(&self) -> Capability {
        Capability::Conversation
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let ToolArgs::Conversation {
            message,
            context,
            follow_up,
            code_request,
        } = args
        else {
            return Err(wrong_args(self.capability(), args));
        };

        let (prompt, options) = if *code_request {
            (code_prompt(message, context), &self.code_options)
        } else {
            (conversation_prompt(message, context, *follow_up), &self.chat_options)
        };

        match self.completion.complete(&prompt, options).await.into_result() {
            Ok(reply) => Ok(ToolOutput::text(reply.trim())),
            Err(e) => {
                warn!(error = %e, "text model unavailable, returning capability overview");
                Ok(ToolOutput::text(CAPABILITY_OVERVIEW)
                    .with_fallback(FallbackKind::CapabilityList, e.to_string()))
            }
        }
    }
}
