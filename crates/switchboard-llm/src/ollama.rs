//! Ollama adapter for [`CompletionService`].
//!
//! Talks to `POST /api/generate` (non-streaming) and discovers installed
//! models once through `GET /api/tags`.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use switchboard_core::config::LlmConfig;

use crate::{CompletionError, CompletionOptions, CompletionResult, CompletionService};

const TAGS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

impl From<&CompletionOptions> for GenerateOptions {
    fn from(o: &CompletionOptions) -> Self {
        Self {
            num_predict: o.max_tokens,
            temperature: o.temperature,
            top_p: o.top_p,
            top_k: o.top_k,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Which model family a call needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelFamily {
    Text,
    Vision,
}

impl ModelFamily {
    fn as_str(self) -> &'static str {
        match self {
            ModelFamily::Text => "text",
            ModelFamily::Vision => "vision",
        }
    }
}

/// HTTP client for a local or remote Ollama server.
pub struct OllamaClient {
    client: reqwest::Client,
    config: LlmConfig,
    installed: OnceCell<Vec<String>>,
}

impl OllamaClient {
    pub fn new(config: LlmConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CompletionError::Unavailable(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            config,
            installed: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Names of installed models. Cached after the first successful lookup.
    pub async fn installed_models(&self) -> Result<Vec<String>, CompletionError> {
        self.installed
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .get(self.url("/api/tags"))
                    .timeout(TAGS_TIMEOUT)
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(CompletionError::Provider(format!(
                        "status={}",
                        response.status().as_u16()
                    )));
                }
                let tags: TagsResponse = response.json().await?;
                let names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
                info!(count = names.len(), "discovered installed models");
                Ok(names)
            })
            .await
            .cloned()
    }

    async fn model_for(&self, family: ModelFamily) -> Result<String, CompletionError> {
        let installed = self.installed_models().await?;
        let preferred = match family {
            ModelFamily::Text => &self.config.text_models,
            ModelFamily::Vision => &self.config.vision_models,
        };
        select_model(family, preferred, &installed)
            .ok_or_else(|| CompletionError::NoModel(family.as_str().to_string()))
    }

    async fn generate(
        &self,
        family: ModelFamily,
        prompt: &str,
        image: Option<&[u8]>,
        options: &CompletionOptions,
    ) -> Result<(String, String), CompletionError> {
        let model = self.model_for(family).await?;
        let body = GenerateRequest {
            model: &model,
            prompt,
            images: image.map(|b| vec![STANDARD.encode(b)]).unwrap_or_default(),
            stream: false,
            options: options.into(),
        };

        debug!(model = %model, family = family.as_str(), "sending generate request");
        let response = self
            .client
            .post(self.url("/api/generate"))
            .timeout(options.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| CompletionError::InvalidPayload(e.to_string()))?;

        if !status.is_success() {
            let reason = parsed.error.unwrap_or_else(|| "no error body".to_string());
            return Err(CompletionError::Provider(format!(
                "status={} {}",
                status.as_u16(),
                reason
            )));
        }
        if let Some(err) = parsed.error {
            return Err(CompletionError::Provider(err));
        }
        let out = parsed
            .response
            .ok_or_else(|| CompletionError::InvalidPayload("missing response field".into()))?;
        Ok((out.trim().to_string(), model))
    }

    fn finish(result: Result<(String, String), CompletionError>) -> CompletionResult {
        match result {
            Ok((text, model)) => CompletionResult::success(text, model),
            Err(e) => {
                warn!(error = %e, "completion failed");
                CompletionResult::failure(e)
            }
        }
    }
}

/// Pick the first installed model matching a preference pattern.
///
/// Text calls fall back to any installed model; vision calls never do,
/// since a text-only model cannot read the image.
fn select_model(family: ModelFamily, preferred: &[String], installed: &[String]) -> Option<String> {
    for pattern in preferred {
        let pattern = pattern.to_lowercase();
        if let Some(hit) = installed
            .iter()
            .find(|name| name.to_lowercase().contains(&pattern))
        {
            return Some(hit.clone());
        }
    }
    match family {
        ModelFamily::Text => installed.first().cloned(),
        ModelFamily::Vision => None,
    }
}

#[async_trait]
impl CompletionService for OllamaClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> CompletionResult {
        Self::finish(self.generate(ModelFamily::Text, prompt, None, options).await)
    }

    async fn complete_with_image(
        &self,
        prompt: &str,
        image: &[u8],
        options: &CompletionOptions,
    ) -> CompletionResult {
        Self::finish(
            self.generate(ModelFamily::Vision, prompt, Some(image), options)
                .await,
        )
    }
}
