//! Switchboard OCR crate - OCR engine trait and implementations.
//!
//! Provides the [`OcrService`] trait for reading literal text out of images,
//! a [`MockOcrService`] for testing, and a [`TesseractOcrService`] that shells
//! out to the `tesseract` binary.

pub mod error;
pub mod tesseract;

use std::sync::Mutex;

use async_trait::async_trait;

pub use error::OcrError;
pub use tesseract::TesseractOcrService;

/// Service for extracting text from uploaded images.
///
/// Object-safe so the image and OCR tool handlers can hold an
/// `Arc<dyn OcrService>` chosen at startup.
#[async_trait]
pub trait OcrService: Send + Sync {
    /// Recognize text in encoded image bytes (PNG, JPEG, ...).
    ///
    /// `language` is a Tesseract language code such as `eng`. The returned
    /// string may be empty if no text is detected.
    async fn recognize_text(&self, image_data: &[u8], language: &str) -> Result<String, OcrError>;
}

/// Mock OCR service for testing.
///
/// Returns a fixed string (or a fixed failure) and remembers the language of
/// every call.
#[derive(Debug)]
pub struct MockOcrService {
    response: Result<String, String>,
    languages: Mutex<Vec<String>>,
}

impl MockOcrService {
    pub fn new() -> Self {
        Self::with_text("Mock OCR extracted text: Lorem ipsum dolor sit amet")
    }

    /// Create a mock OCR service that returns the specified text.
    pub fn with_text(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            languages: Mutex::new(Vec::new()),
        }
    }

    /// No text found.
    pub fn empty() -> Self {
        Self::with_text("")
    }

    /// Every call fails with `OcrError::Engine(reason)`.
    pub fn failing(reason: &str) -> Self {
        Self {
            response: Err(reason.to_string()),
            languages: Mutex::new(Vec::new()),
        }
    }

    /// Languages passed to each call so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.languages
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}

impl Default for MockOcrService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrService for MockOcrService {
    async fn recognize_text(&self, image_data: &[u8], language: &str) -> Result<String, OcrError> {
        if let Ok(mut langs) = self.languages.lock() {
            langs.push(language.to_string());
        }
        if image_data.is_empty() {
            return Err(OcrError::EmptyImage);
        }
        self.response.clone().map_err(OcrError::Engine)
    }
}
