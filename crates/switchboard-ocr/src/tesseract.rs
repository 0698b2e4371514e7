//! OCR through the `tesseract` command-line engine.
//!
//! The image is piped on stdin (`tesseract stdin stdout -l <lang>`) so no
//! temporary files are written.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use switchboard_core::config::OcrConfig;

use crate::{OcrError, OcrService};

/// Tesseract-backed OCR service.
pub struct TesseractOcrService {
    config: OcrConfig,
}

impl TesseractOcrService {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Arguments passed to the binary for one recognition call.
    fn args(language: &str) -> Vec<String> {
        vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            language.to_string(),
        ]
    }

    async fn run(&self, image_data: &[u8], language: &str) -> Result<String, OcrError> {
        let mut child = Command::new(&self.config.tesseract_binary)
            .args(Self::args(language))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                OcrError::Unavailable(format!("{}: {}", self.config.tesseract_binary, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image_data)
                .await
                .map_err(|e| OcrError::Engine(format!("Failed to write image: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OcrError::Engine(format!("tesseract did not finish: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl OcrService for TesseractOcrService {
    async fn recognize_text(&self, image_data: &[u8], language: &str) -> Result<String, OcrError> {
        if image_data.is_empty() {
            return Err(OcrError::EmptyImage);
        }
        let language = if language.trim().is_empty() {
            self.config.language.as_str()
        } else {
            language
        };

        debug!(bytes = image_data.len(), language, "running tesseract");
        let secs = self.config.timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), self.run(image_data, language)).await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = secs, "tesseract timed out");
                Err(OcrError::Timeout(secs))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with_binary(binary: &str) -> TesseractOcrService {
        TesseractOcrService::new(OcrConfig {
            tesseract_binary: binary.to_string(),
            ..OcrConfig::default()
        })
    }

    #[test]
    fn test_args_pipe_stdin_to_stdout() {
        assert_eq!(
            TesseractOcrService::args("eng"),
            vec!["stdin", "stdout", "-l", "eng"]
        );
    }

    #[test]
    fn test_config_accessor() {
        let service = TesseractOcrService::new(OcrConfig::default());
        assert_eq!(service.config().language, "eng");
    }

    #[tokio::test]
    async fn test_empty_image_rejected_before_spawn() {
        let service = service_with_binary("/definitely/not/tesseract");
        let err = service.recognize_text(&[], "eng").await.unwrap_err();
        assert_eq!(err, OcrError::EmptyImage);
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let service = service_with_binary("/definitely/not/tesseract");
        let err = service.recognize_text(&[1, 2, 3], "eng").await.unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)));
    }
}
