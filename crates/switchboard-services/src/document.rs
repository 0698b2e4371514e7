//! PDF text extraction using `lopdf`.

use std::sync::Mutex;

use async_trait::async_trait;
use lopdf::Document as PdfDocument;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Text pulled out of a document, page markers included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedDocument {
    pub text: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Empty document")]
    Empty,

    #[error("File too large: {size} bytes. Maximum size is {limit_mb}MB")]
    TooLarge { size: usize, limit_mb: usize },

    #[error("Error reading PDF: {0}")]
    Parse(String),

    #[error("PDF extraction task failed: {0}")]
    Task(String),
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_text(&self, bytes: &[u8]) -> Result<ExtractedDocument, DocumentError>;
}

/// PDF extractor with a size ceiling.
pub struct LopdfExtractor {
    max_bytes: usize,
}

impl LopdfExtractor {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    fn check_size(&self, bytes: &[u8]) -> Result<(), DocumentError> {
        if bytes.is_empty() {
            return Err(DocumentError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(DocumentError::TooLarge {
                size: bytes.len(),
                limit_mb: self.max_bytes / 1024 / 1024,
            });
        }
        Ok(())
    }
}

fn extract_blocking(bytes: &[u8]) -> Result<ExtractedDocument, DocumentError> {
    let doc = PdfDocument::load_mem(bytes).map_err(|e| DocumentError::Parse(e.to_string()))?;
    let pages = doc.get_pages();
    let page_count = pages.len();

    let mut text = String::new();
    for (index, page_num) in pages.keys().enumerate() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => {
                text.push_str(&format!("\n--- Page {} ---\n", index + 1));
                text.push_str(page_text.trim());
                text.push('\n');
            }
            Err(e) => warn!("Failed to extract text from page {}: {}", page_num, e),
        }
    }

    Ok(ExtractedDocument {
        text: text.trim().to_string(),
        page_count,
    })
}

#[async_trait]
impl DocumentExtractor for LopdfExtractor {
    async fn extract_text(&self, bytes: &[u8]) -> Result<ExtractedDocument, DocumentError> {
        self.check_size(bytes)?;
        let data = bytes.to_vec();
        let doc = tokio::task::spawn_blocking(move || extract_blocking(&data))
            .await
            .map_err(|e| DocumentError::Task(e.to_string()))??;
        debug!(pages = doc.page_count, chars = doc.text.len(), "pdf text extracted");
        Ok(doc)
    }
}

/// Extractor returning fixed text; records payload sizes.
#[derive(Debug)]
pub struct MockDocumentExtractor {
    response: Result<ExtractedDocument, DocumentError>,
    sizes: Mutex<Vec<usize>>,
}

impl MockDocumentExtractor {
    pub fn with_text(text: &str, page_count: usize) -> Self {
        Self {
            response: Ok(ExtractedDocument {
                text: text.to_string(),
                page_count,
            }),
            sizes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: DocumentError) -> Self {
        Self {
            response: Err(error),
            sizes: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<usize> {
        self.sizes.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for MockDocumentExtractor {
    fn default() -> Self {
        Self::with_text(
            "Quarterly Report. This document summarizes the key results of the quarter in detail.",
            1,
        )
    }
}

#[async_trait]
impl DocumentExtractor for MockDocumentExtractor {
    async fn extract_text(&self, bytes: &[u8]) -> Result<ExtractedDocument, DocumentError> {
        if let Ok(mut s) = self.sizes.lock() {
            s.push(bytes.len());
        }
        if bytes.is_empty() {
            return Err(DocumentError::Empty);
        }
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn one_page_pdf() -> Vec<u8> {
        let mut doc = PdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal("Hello PDF")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[tokio::test]
    async fn test_extract_page_count() {
        let extractor = LopdfExtractor::new(10 * 1024 * 1024);
        let doc = extractor.extract_text(&one_page_pdf()).await.unwrap();
        assert_eq!(doc.page_count, 1);
    }

    #[tokio::test]
    async fn test_rejects_garbage() {
        let extractor = LopdfExtractor::new(1024);
        let err = extractor.extract_text(b"not a pdf").await.unwrap_err();
        assert!(matches!(err, DocumentError::Parse(_)));
    }

    #[tokio::test]
    async fn test_rejects_oversized() {
        let extractor = LopdfExtractor::new(2 * 1024 * 1024);
        let big = vec![0u8; 2 * 1024 * 1024 + 1];
        let err = extractor.extract_text(&big).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("File too large: {} bytes. Maximum size is 2MB", big.len())
        );
    }

    #[tokio::test]
    async fn test_rejects_empty() {
        let extractor = LopdfExtractor::new(1024);
        assert_eq!(
            extractor.extract_text(&[]).await.unwrap_err(),
            DocumentError::Empty
        );
    }

    #[tokio::test]
    async fn test_mock_extractor() {
        let mock = MockDocumentExtractor::with_text("hello", 3);
        let doc = mock.extract_text(&[1, 2]).await.unwrap();
        assert_eq!(doc.page_count, 3);
        assert_eq!(mock.calls(), vec![2]);
    }
}
