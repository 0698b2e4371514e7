//! Error types for tool handlers.

use switchboard_core::Capability;
use switchboard_llm::CompletionError;
use switchboard_ocr::OcrError;
use switchboard_services::{DocumentError, MailError, NewsError, WeatherError};

/// Errors from tool handler execution.
///
/// Never shown raw to the user: the dispatcher renders them into a
/// capability-tagged line.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Wrong arguments for {capability}: got {got}")]
    WrongArgs {
        capability: Capability,
        got: &'static str,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Only basic math operations allowed")]
    ForbiddenExpression(String),
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Tool not registered: {0}")]
    Unregistered(Capability),
    #[error("Timed out after {0} seconds")]
    Timeout(u64),
    #[error("Tool crashed: {0}")]
    Panicked(String),
    #[error("Could not read the image (vision: {vision}; OCR: {ocr})")]
    ImageUnreadable { vision: String, ocr: String },
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error(transparent)]
    News(#[from] NewsError),
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}
