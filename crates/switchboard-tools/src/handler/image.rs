//! Image handler: vision-model description with an OCR fallback, or plain
//! text extraction.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use switchboard_core::Capability;
use switchboard_llm::{CompletionOptions, CompletionService};
use switchboard_ocr::OcrService;

use crate::error::ToolError;
use crate::handler::{wrong_args, ToolHandler};
use crate::types::{FallbackKind, ImageMode, ToolArgs, ToolOutput};

pub const DEFAULT_IMAGE_PROMPT: &str = "Describe this image in detail:";
pub const NO_IMAGE_TO_DESCRIBE: &str = "Please upload an image and I'll describe it for you.";
pub const NO_IMAGE_TO_READ: &str = "Please upload an image and I'll extract the text from it.";

/// Handler for image description and text extraction.
pub struct ImageHandler {
    completion: Arc<dyn CompletionService>,
    ocr: Arc<dyn OcrService>,
    options: CompletionOptions,
    language: String,
}

impl ImageHandler {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        ocr: Arc<dyn OcrService>,
        options: CompletionOptions,
        language: impl Into<String>,
    ) -> Self {
        Self {
            completion,
            ocr,
            options,
            language: language.into(),
        }
    }

    async fn describe_image(&self, image: &[u8], prompt: &str) -> Result<ToolOutput, ToolError> {
        let prompt = if prompt.trim().is_empty() {
            DEFAULT_IMAGE_PROMPT
        } else {
            prompt.trim()
        };
        let vision_error = match self
            .completion
            .complete_with_image(prompt, image, &self.options)
            .await
            .into_result()
        {
            Ok(description) => {
                return Ok(ToolOutput::text(format!(
                    "Detailed Image Analysis\n\n{}",
                    description.trim()
                )))
            }
            Err(e) => e,
        };

        warn!(error = %vision_error, "vision model failed, falling back to OCR");
        let text = self
            .ocr
            .recognize_text(image, &self.language)
            .await
            .map_err(|ocr_error| ToolError::ImageUnreadable {
                vision: vision_error.to_string(),
                ocr: ocr_error.to_string(),
            })?;

        let banner = "Image description is unavailable right now, so here is the text read from the image with OCR instead.";
        let body = if text.trim().is_empty() {
            "No readable text was found in the image.".to_string()
        } else {
            format!("Extracted text:\n\n{}", text.trim())
        };
        Ok(ToolOutput::text(format!("{}\n\n{}", banner, body))
            .with_fallback(FallbackKind::VisionToOcr, vision_error.to_string()))
    }

    async fn read_text(&self, image: &[u8]) -> Result<ToolOutput, ToolError> {
        let text = self.ocr.recognize_text(image, &self.language).await?;
        debug!(chars = text.len(), "ocr finished");
        if text.trim().is_empty() {
            return Ok(ToolOutput::text("No text found in the image."));
        }
        Ok(ToolOutput::text(format!("Extracted text:\n\n{}", text.trim())))
    }
}

#[async_trait]
impl ToolHandler for ImageHandler {
    fn capability(&self) -> Capability {
        Capability::Ocr
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let ToolArgs::Image {
            image,
            prompt,
            mode,
        } = args
        else {
            return Err(wrong_args(self.capability(), args));
        };
        match (image.as_deref(), mode) {
            (None, ImageMode::Describe) => Ok(ToolOutput::text(NO_IMAGE_TO_DESCRIBE)),
            (None, ImageMode::ReadText) => Ok(ToolOutput::text(NO_IMAGE_TO_READ)),
            (Some(bytes), ImageMode::Describe) => self.describe_image(bytes, prompt).await,
            (Some(bytes), ImageMode::ReadText) => self.read_text(bytes).await,
        }
    }

    fn describe(&self, args: &ToolArgs) -> String {
        match args {
            ToolArgs::Image {
                mode: ImageMode::Describe,
                ..
            } => "Describe image".to_string(),
            _ => "Read text from image".to_string(),
        }
    }
}
