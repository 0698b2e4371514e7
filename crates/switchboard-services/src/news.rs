//! Headline search against NewsAPI.org.
//!
//! Failures come back as a structured [`NewsError`] rather than
//! error-prefixed text; the news tool turns them into user-facing lines.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use switchboard_core::config::NewsConfig;

const REMOVED: &str = "[Removed]";
const SEARCH_WINDOW_DAYS: i64 = 3;
const SEARCH_FETCH_SIZE: u32 = 15;
const DESCRIPTION_CHARS: usize = 120;

/// One article in a headline list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub description: Option<String>,
    pub source: String,
    pub url: String,
    /// Publication date (`YYYY-MM-DD`), when known.
    pub published: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NewsError {
    #[error("News API key not configured")]
    MissingApiKey,

    #[error("NewsAPI error {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Cannot connect to news service: {0}")]
    Network(String),

    #[error("News service timed out")]
    Timeout,

    #[error("Unexpected news payload: {0}")]
    InvalidPayload(String),
}

impl From<reqwest::Error> for NewsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NewsError::Timeout
        } else if err.is_decode() {
            NewsError::InvalidPayload(err.to_string())
        } else {
            NewsError::Network(err.to_string())
        }
    }
}

#[async_trait]
pub trait NewsService: Send + Sync {
    /// Recent articles about `query` (a country key such as `india` or free text).
    async fn search(&self, query: &str) -> Result<Vec<Headline>, NewsError>;

    /// Global top headlines.
    async fn breaking(&self) -> Result<Vec<Headline>, NewsError>;
}

/// Search terms and relevance keywords per supported country.
struct CountryTerms {
    key: &'static str,
    query_terms: &'static [&'static str],
    relevance: &'static [&'static str],
}

const COUNTRY_TERMS: &[CountryTerms] = &[
    CountryTerms {
        key: "india",
        query_terms: &["India", "Indian", "Delhi", "Mumbai", "Chennai"],
        relevance: &[
            "india", "indian", "delhi", "mumbai", "chennai", "kolkata", "bangalore", "modi",
            "bollywood",
        ],
    },
    CountryTerms {
        key: "usa",
        query_terms: &["United States", "USA", "US", "Washington", "White House"],
        relevance: &[
            "united states", "usa", "washington", "white house", "senate", "american",
            "new york", "california", "texas", "florida",
        ],
    },
    CountryTerms {
        key: "uk",
        query_terms: &["United Kingdom", "UK", "Britain", "London", "British"],
        relevance: &[
            "united kingdom", "uk", "britain", "london", "british", "parliament", "england",
            "scotland",
        ],
    },
    CountryTerms {
        key: "canada",
        query_terms: &["Canada", "Canadian", "Ottawa", "Toronto", "Vancouver"],
        relevance: &["canada", "canadian", "ottawa", "toronto", "vancouver"],
    },
    CountryTerms {
        key: "australia",
        query_terms: &["Australia", "Australian", "Sydney", "Melbourne", "Canberra"],
        relevance: &["australia", "australian", "sydney", "melbourne", "canberra"],
    },
    CountryTerms {
        key: "germany",
        query_terms: &["Germany", "German", "Berlin"],
        relevance: &["germany", "german", "berlin"],
    },
    CountryTerms {
        key: "france",
        query_terms: &["France", "French", "Paris", "Macron"],
        relevance: &["france", "french", "paris", "macron"],
    },
    CountryTerms {
        key: "japan",
        query_terms: &["Japan", "Japanese", "Tokyo"],
        relevance: &["japan", "japanese", "tokyo"],
    },
    CountryTerms {
        key: "world",
        query_terms: &["world", "international", "global"],
        relevance: &["world", "international", "global", "nations", "summit"],
    },
];

fn country_terms(query: &str) -> Option<&'static CountryTerms> {
    let q = query.trim().to_lowercase();
    COUNTRY_TERMS.iter().find(|c| c.key == q)
}

/// NewsAPI `q` parameter for a query.
fn search_query(query: &str) -> String {
    match country_terms(query) {
        Some(c) => c.query_terms.join(" OR "),
        None => query.trim().to_string(),
    }
}

/// Whether an article is about the requested country (or mentions the free-text query).
fn is_relevant(title: &str, description: Option<&str>, query: &str) -> bool {
    let text = format!("{} {}", title, description.unwrap_or_default()).to_lowercase();
    match country_terms(query) {
        Some(c) => c.relevance.iter().any(|k| contains_word(&text, k)),
        None => text.contains(&query.trim().to_lowercase()),
    }
}

/// Word-boundary containment so "us" does not match "because".
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    } else {
        s.to_string()
    }
}

// =============================================================================
// NewsAPI.org client
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
struct ApiArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    source: Option<ApiSource>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

impl ApiArticle {
    fn into_headline(self) -> Option<Headline> {
        let title = self.title.map(|t| t.trim().to_string())?;
        if title.is_empty() || title == REMOVED {
            return None;
        }
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty() && d != REMOVED)
            .map(|d| truncate_chars(&d, DESCRIPTION_CHARS));
        Some(Headline {
            title,
            description,
            source: self
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            url: self.url.unwrap_or_else(|| "#".to_string()),
            published: self
                .published_at
                .map(|p| p.chars().take(10).collect::<String>()),
        })
    }
}

pub struct NewsApiClient {
    client: reqwest::Client,
    config: NewsConfig,
}

impl NewsApiClient {
    pub fn new(config: NewsConfig) -> Result<Self, NewsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NewsError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn api_key(&self) -> Result<&str, NewsError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(NewsError::MissingApiKey)
    }

    async fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<ApiArticle>, NewsError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let response = self
            .client
            .get(url)
            .header("X-Api-Key", self.api_key()?)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NewsError::Provider {
                status: status.as_u16(),
                message,
            });
        }
        let parsed: ApiResponse =
            serde_json::from_str(&body).map_err(|e| NewsError::InvalidPayload(e.to_string()))?;
        Ok(parsed.articles)
    }
}

#[async_trait]
impl NewsService for NewsApiClient {
    async fn search(&self, query: &str) -> Result<Vec<Headline>, NewsError> {
        let to = Utc::now().date_naive();
        let from = to - ChronoDuration::days(SEARCH_WINDOW_DAYS);
        let q = search_query(query);
        debug!(query = %q, "searching news");

        let params = [
            ("q", q),
            ("from", from.format("%Y-%m-%d").to_string()),
            ("to", to.format("%Y-%m-%d").to_string()),
            ("language", "en".to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", SEARCH_FETCH_SIZE.to_string()),
        ];
        let articles = self.fetch("everything", &params).await?;
        let fetched = articles.len();
        let headlines: Vec<Headline> = articles
            .into_iter()
            .filter_map(ApiArticle::into_headline)
            .filter(|h| is_relevant(&h.title, h.description.as_deref(), query))
            .take(self.config.page_size as usize)
            .collect();
        info!(query, fetched, kept = headlines.len(), "news search complete");
        Ok(headlines)
    }

    async fn breaking(&self) -> Result<Vec<Headline>, NewsError> {
        let params = [
            ("country", "us".to_string()),
            ("pageSize", self.config.page_size.to_string()),
        ];
        let articles = self.fetch("top-headlines", &params).await?;
        Ok(articles
            .into_iter()
            .filter_map(ApiArticle::into_headline)
            .collect())
    }
}

// =============================================================================
// Mock
// =============================================================================

/// Which call a [`MockNewsService`] received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsCall {
    Search(String),
    Breaking,
}

#[derive(Debug)]
pub struct MockNewsService {
    response: Result<Vec<Headline>, NewsError>,
    calls: Mutex<Vec<NewsCall>>,
}

impl MockNewsService {
    pub fn new() -> Self {
        Self::with_headlines(vec![
            sample_headline("Markets rally on rate hopes"),
            sample_headline("Monsoon arrives early"),
        ])
    }

    pub fn with_headlines(headlines: Vec<Headline>) -> Self {
        Self {
            response: Ok(headlines),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: NewsError) -> Self {
        Self {
            response: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<NewsCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: NewsCall) {
        if let Ok(mut c) = self.calls.lock() {
            c.push(call);
        }
    }
}

impl Default for MockNewsService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsService for MockNewsService {
    async fn search(&self, query: &str) -> Result<Vec<Headline>, NewsError> {
        self.record(NewsCall::Search(query.to_string()));
        self.response.clone()
    }

    async fn breaking(&self) -> Result<Vec<Headline>, NewsError> {
        self.record(NewsCall::Breaking);
        self.response.clone()
    }
}

pub fn sample_headline(title: &str) -> Headline {
    Headline {
        title: title.to_string(),
        description: Some("Details to follow.".to_string()),
        source: "Mock Wire".to_string(),
        url: "https://example.com/story".to_string(),
        published: Some("2024-06-01".to_string()),
    }
}
