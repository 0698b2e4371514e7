//! PDF analysis handler.
//!
//! Extracts text (or reuses text from an earlier turn), builds the local
//! report, and asks the text model for a fuller summary. When the model is
//! unavailable the local report is the answer.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use switchboard_core::Capability;
use switchboard_llm::{CompletionOptions, CompletionService};
use switchboard_services::DocumentExtractor;

use crate::analysis;
use crate::error::ToolError;
use crate::handler::{wrong_args, ToolHandler};
use crate::types::{DocumentDigest, DocumentInput, FallbackKind, ToolArgs, ToolOutput};

pub const NO_DOCUMENT: &str = "I can analyze PDF documents. Please upload a PDF file.";

const SUMMARY_MAX_TOKENS: u32 = 600;
const SUMMARY_TEMPERATURE: f32 = 0.6;

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    } else {
        text.to_string()
    }
}

pub fn summary_prompt(request: &str, text: &str, page_count: usize, max_chars: usize) -> String {
    let mut prompt = String::from(
        "Analyze the following document and write a comprehensive summary covering its main topic, key points and conclusions.\n",
    );
    let request = request.trim();
    if !request.is_empty() {
        prompt.push_str(&format!("The user asked: {}\n", request));
    }
    prompt.push_str(&format!(
        "\nDocument ({} page{}):\n{}\n",
        page_count,
        if page_count == 1 { "" } else { "s" },
        excerpt(text, max_chars)
    ));
    prompt
}

/// Handler for PDF uploads and follow-up questions about them.
pub struct DocumentHandler {
    extractor: Arc<dyn DocumentExtractor>,
    completion: Arc<dyn CompletionService>,
    options: CompletionOptions,
    summary_chars: usize,
    prompt_chars: usize,
}

impl DocumentHandler {
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        completion: Arc<dyn CompletionService>,
        options: CompletionOptions,
        summary_chars: usize,
        prompt_chars: usize,
    ) -> Self {
        Self {
            extractor,
            completion,
            options: options
                .with_max_tokens(SUMMARY_MAX_TOKENS)
                .with_temperature(SUMMARY_TEMPERATURE),
            summary_chars,
            prompt_chars,
        }
    }
}

#[async_trait]
impl ToolHandler for DocumentHandler {
    fn capability(&self) -> Capability {
        Capability::PdfAnalysis
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let ToolArgs::Document { input, prompt } = args else {
            return Err(wrong_args(self.capability(), args));
        };
        let (text, page_count) = match input {
            DocumentInput::Upload(bytes) => {
                let doc = self.extractor.extract_text(bytes).await?;
                (doc.text, doc.page_count)
            }
            DocumentInput::Extracted { text, page_count } => (text.clone(), *page_count),
            DocumentInput::Missing => return Ok(ToolOutput::text(NO_DOCUMENT)),
        };

        let report = analysis::analyze(&text, page_count, self.summary_chars);
        let digest = DocumentDigest {
            text: text.clone(),
            summary: report.summary.clone(),
            page_count,
        };

        if text.trim().is_empty() {
            return Ok(ToolOutput::text(format!(
                "The PDF has {} page(s) but no extractable text. It may be a scanned document; try sending the pages as images so the text can be read with OCR.",
                page_count
            ))
            .with_digest(digest));
        }

        let llm_prompt = summary_prompt(prompt, &text, page_count, self.prompt_chars);
        let output = match self
            .completion
            .complete(&llm_prompt, &self.options)
            .await
            .into_result()
        {
            Ok(summary) => ToolOutput::text(format!(
                "Comprehensive PDF Analysis\n\n{}\n\n{}",
                summary.trim(),
                report.render()
            )),
            Err(e) => {
                warn!(error = %e, "text model unavailable, returning local document report");
                ToolOutput::text(report.render())
                    .with_fallback(FallbackKind::LocalDocumentReport, e.to_string())
            }
        };
        Ok(output.with_digest(digest))
    }
}
