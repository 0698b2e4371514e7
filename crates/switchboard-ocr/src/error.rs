use thiserror::Error;

/// Errors from an OCR engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OcrError {
    #[error("Empty image data")]
    EmptyImage,

    #[error("OCR engine not available: {0}")]
    Unavailable(String),

    #[error("OCR engine error: {0}")]
    Engine(String),

    #[error("OCR timed out after {0} seconds")]
    Timeout(u64),
}
