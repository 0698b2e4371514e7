use std::sync::Mutex;

use async_trait::async_trait;

use crate::{CompletionError, CompletionOptions, CompletionResult, CompletionService};

/// One recorded call to the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCompletion {
    pub prompt: String,
    pub image_len: Option<usize>,
}

/// Deterministic completion service for tests and `--offline` runs.
///
/// Text and vision replies are configured independently so a test can make
/// the vision model fail while text generation still works.
#[derive(Debug)]
pub struct MockCompletionService {
    text_reply: Result<String, CompletionError>,
    vision_reply: Result<String, CompletionError>,
    calls: Mutex<Vec<RecordedCompletion>>,
}

impl MockCompletionService {
    pub fn new() -> Self {
        Self {
            text_reply: Ok("This is a mock assistant reply.".to_string()),
            vision_reply: Ok("The image shows a mock scene.".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every text completion returns `text`.
    pub fn with_text(text: &str) -> Self {
        Self::new().text_reply(Ok(text.to_string()))
    }

    /// Both text and vision calls fail with `error`.
    pub fn unavailable(error: CompletionError) -> Self {
        Self::new()
            .text_reply(Err(error.clone()))
            .vision_reply(Err(error))
    }

    pub fn text_reply(mut self, reply: Result<String, CompletionError>) -> Self {
        self.text_reply = reply;
        self
    }

    pub fn vision_reply(mut self, reply: Result<String, CompletionError>) -> Self {
        self.vision_reply = reply;
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCompletion> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, prompt: &str, image_len: Option<usize>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCompletion {
                prompt: prompt.to_string(),
                image_len,
            });
        }
    }

    fn reply(result: &Result<String, CompletionError>, model: &str) -> CompletionResult {
        match result {
            Ok(text) => CompletionResult::success(text.clone(), model),
            Err(e) => CompletionResult::failure(e.clone()),
        }
    }
}

impl Default for MockCompletionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> CompletionResult {
        self.record(prompt, None);
        Self::reply(&self.text_reply, "mock-text")
    }

    async fn complete_with_image(
        &self,
        prompt: &str,
        image: &[u8],
        _options: &CompletionOptions,
    ) -> CompletionResult {
        self.record(prompt, Some(image.len()));
        Self::reply(&self.vision_reply, "mock-vision")
    }
}
