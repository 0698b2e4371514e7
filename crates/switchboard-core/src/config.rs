use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

pub const ENV_WEATHER_API_KEY: &str = "SWITCHBOARD_WEATHER_API_KEY";
pub const ENV_NEWS_API_KEY: &str = "SWITCHBOARD_NEWS_API_KEY";
pub const ENV_SMTP_USERNAME: &str = "SWITCHBOARD_SMTP_USERNAME";
pub const ENV_SMTP_PASSWORD: &str = "SWITCHBOARD_SMTP_PASSWORD";
pub const ENV_LLM_URL: &str = "SWITCHBOARD_LLM_URL";

/// Top-level configuration for Switchboard.
///
/// Loaded from `~/.switchboard/config.toml` by default. Every section is
/// optional in the file; missing sections fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchboardConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub documents: DocumentConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl SwitchboardConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SwitchboardConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay secrets and endpoints from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay values produced by `lookup`. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_WEATHER_API_KEY) {
            debug!("weather API key taken from {}", ENV_WEATHER_API_KEY);
            self.weather.api_key = Some(v);
        }
        if let Some(v) = get(ENV_NEWS_API_KEY) {
            debug!("news API key taken from {}", ENV_NEWS_API_KEY);
            self.news.api_key = Some(v);
        }
        if let Some(v) = get(ENV_SMTP_USERNAME) {
            self.email.username = Some(v);
        }
        if let Some(v) = get(ENV_SMTP_PASSWORD) {
            self.email.password = Some(v);
        }
        if let Some(v) = get(ENV_LLM_URL) {
            self.llm.base_url = v;
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Conversation memory and session lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum interactions kept per session.
    pub capacity: usize,
    /// Interactions rendered into the LLM context block.
    pub context_window: usize,
    /// Characters of each stored response shown in the context block.
    pub response_preview_chars: usize,
    /// Idle minutes before a session is dropped from the store.
    pub session_timeout_minutes: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            context_window: 3,
            response_preview_chars: 150,
            session_timeout_minutes: 30,
        }
    }
}

/// Completion service (Ollama-compatible HTTP endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    /// Text models in order of preference; the first one installed wins.
    pub text_models: Vec<String>,
    /// Vision models in order of preference.
    pub vision_models: Vec<String>,
    pub text_timeout_secs: u64,
    pub vision_timeout_secs: u64,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            text_models: vec![
                "gemma2:2b".to_string(),
                "llama3.2".to_string(),
                "mistral".to_string(),
            ],
            vision_models: vec![
                "llava:7b".to_string(),
                "llava:13b".to_string(),
                "bakllava:7b".to_string(),
                "llava:1.6".to_string(),
            ],
            text_timeout_secs: 45,
            vision_timeout_secs: 60,
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 500,
        }
    }
}

/// WeatherAPI.com client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Location used when none can be extracted from the message.
    pub default_location: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.weatherapi.com/v1".to_string(),
            api_key: None,
            timeout_secs: 10,
            default_location: "New Delhi".to_string(),
        }
    }
}

/// NewsAPI.org client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Country searched when the message names none.
    pub default_country: String,
    pub page_size: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".to_string(),
            api_key: None,
            timeout_secs: 15,
            default_country: "india".to_string(),
            page_size: 5,
        }
    }
}

/// SMTP transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Display name used in the From header and signatures.
    pub sender_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: None,
            password: None,
            sender_name: "Switchboard Assistant".to_string(),
        }
    }
}

/// Tesseract OCR engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub tesseract_binary: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_binary: "tesseract".to_string(),
            language: "eng".to_string(),
            timeout_secs: 30,
        }
    }
}

/// PDF handling limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub max_bytes: usize,
    /// Maximum characters in the locally generated summary.
    pub summary_chars: usize,
    /// Characters of document text included in an LLM summary prompt.
    pub prompt_chars: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            summary_chars: 500,
            prompt_chars: 8000,
        }
    }
}

/// Per-capability dispatch deadlines. A deadline hit is a failed turn,
/// never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Local tools: calculator, time, unit conversion.
    pub local_timeout_secs: u64,
    /// Weather and news lookups.
    pub lookup_timeout_secs: u64,
    /// Email send and PDF analysis.
    pub io_timeout_secs: u64,
    /// Conversation turns through the text model.
    pub llm_timeout_secs: u64,
    /// Image analysis through the vision model, including OCR fallback.
    pub vision_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            local_timeout_secs: 5,
            lookup_timeout_secs: 20,
            io_timeout_secs: 90,
            llm_timeout_secs: 60,
            vision_timeout_secs: 120,
        }
    }
}
