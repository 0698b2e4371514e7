//! Completion-service contract for Switchboard.
//!
//! Handlers only ever see a [`CompletionResult`]; provider response shapes
//! are decoded by the adapter ([`OllamaClient`]) and never leak upward.

pub mod error;
pub mod mock;
pub mod ollama;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use switchboard_core::config::LlmConfig;

pub use error::{CompletionError, CompletionErrorKind};
pub use mock::MockCompletionService;
pub use ollama::OllamaClient;

/// Generation parameters for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    /// Deadline for the HTTP exchange. Expiry is a failed call, not a retry.
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.7,
            top_p: None,
            top_k: None,
            timeout: Duration::from_secs(45),
        }
    }
}

impl CompletionOptions {
    /// Options for text generation using the configured budget.
    pub fn text(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: Some(config.top_p),
            top_k: None,
            timeout: Duration::from_secs(config.text_timeout_secs),
        }
    }

    /// Options for image analysis: lower temperature, longer deadline.
    pub fn vision(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: 0.4,
            top_p: None,
            top_k: Some(40),
            timeout: Duration::from_secs(config.vision_timeout_secs),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Typed outcome of a completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionResult {
    pub text: String,
    /// Model that produced the text, when one was selected.
    pub model: Option<String>,
    #[serde(skip)]
    pub error: Option<CompletionError>,
}

impl CompletionResult {
    pub fn success(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: Some(model.into()),
            error: None,
        }
    }

    pub fn failure(error: CompletionError) -> Self {
        Self {
            text: String::new(),
            model: None,
            error: Some(error),
        }
    }

    pub fn ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_kind(&self) -> Option<CompletionErrorKind> {
        self.error.as_ref().map(CompletionError::kind)
    }

    /// Convert into a `Result` so callers can use `?`.
    ///
    /// A successful call that produced only whitespace is reported as an
    /// invalid payload.
    pub fn into_result(self) -> Result<String, CompletionError> {
        match self.error {
            Some(e) => Err(e),
            None if self.text.trim().is_empty() => Err(CompletionError::InvalidPayload(
                "empty completion".to_string(),
            )),
            None => Ok(self.text),
        }
    }
}

/// Text and vision completion service.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate text for `prompt` with the preferred text model.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> CompletionResult;

    /// Generate text about an image with the preferred vision model.
    async fn complete_with_image(
        &self,
        prompt: &str,
        image: &[u8],
        options: &CompletionOptions,
    ) -> CompletionResult;
}
