//! News handler: country search, breaking and world headlines.

use std::sync::Arc;

use async_trait::async_trait;

use switchboard_core::Capability;
use switchboard_services::{Headline, NewsService};

use crate::error::ToolError;
use crate::handler::{wrong_args, ToolHandler};
use crate::types::{NewsScope, ToolArgs, ToolOutput};

const WORLD_QUERY: &str = "world";

fn heading(scope: &NewsScope) -> String {
    match scope {
        NewsScope::Country(country) => format!("{} News - Latest Updates", country.to_uppercase()),
        NewsScope::Breaking => "Breaking News".to_string(),
        NewsScope::World => "World News".to_string(),
    }
}

/// Numbered headline list.
pub fn render_headlines(title: &str, headlines: &[Headline]) -> String {
    let mut out = format!("{}\n", title);
    for (i, h) in headlines.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n", i + 1, h.title));
        if let Some(desc) = h.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!("   {}\n", desc));
        }
        let mut meta = vec![h.source.clone()];
        if let Some(date) = &h.published {
            meta.push(date.clone());
        }
        out.push_str(&format!("   {}\n", meta.join(" | ")));
        if !h.url.is_empty() {
            out.push_str(&format!("   {}\n", h.url));
        }
    }
    out.trim_end().to_string()
}

/// Handler for headline requests.
pub struct NewsHandler {
    service: Arc<dyn NewsService>,
}

impl NewsHandler {
    pub fn new(service: Arc<dyn NewsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ToolHandler for NewsHandler {
    fn capability(&self) -> Capability {
        Capability::NewsSearch
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutput, ToolError> {
        let ToolArgs::News { scope } = args else {
            return Err(wrong_args(self.capability(), args));
        };
        let headlines = match scope {
            NewsScope::Country(country) => self.service.search(country).await?,
            NewsScope::World => self.service.search(WORLD_QUERY).await?,
            NewsScope::Breaking => self.service.breaking().await?,
        };
        tracing::debug!(count = headlines.len(), "headlines fetched");

        if headlines.is_empty() {
            let text = match scope {
                NewsScope::Country(country) => format!(
                    "No recent news found for {}. Try asking for breaking news instead.",
                    country
                ),
                _ => "No headlines are available right now. Please try again later.".to_string(),
            };
            return Ok(ToolOutput::text(text));
        }
        Ok(ToolOutput::text(render_headlines(&heading(scope), &headlines)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_services::news::sample_headline;
    use switchboard_services::{MockNewsService, NewsCall, NewsError};

    fn news(scope: NewsScope) -> ToolArgs {
        ToolArgs::News { scope }
    }

    #[test]
    fn test_render_headlines() {
        let text = render_headlines("Breaking News", &[sample_headline("A"), sample_headline("B")]);
        assert!(text.starts_with("Breaking News\n\n1. A\n   Details to follow.\n   Mock Wire | 2024-06-01"));
        assert!(text.contains("\n2. B\n"));
        assert!(text.ends_with("https://example.com/story"));
    }

    #[tokio::test]
    async fn test_country_scope_searches() {
        let service = Arc::new(MockNewsService::new());
        let handler = NewsHandler::new(service.clone());
        let out = handler
            .execute(&news(NewsScope::Country("india".into())))
            .await
            .unwrap();
        assert!(out.text.starts_with("INDIA News - Latest Updates"));
        assert_eq!(service.calls(), vec![NewsCall::Search("india".into())]);
    }

    #[tokio::test]
    async fn test_breaking_and_world() {
        let service = Arc::new(MockNewsService::new());
        let handler = NewsHandler::new(service.clone());
        handler.execute(&news(NewsScope::Breaking)).await.unwrap();
        handler.execute(&news(NewsScope::World)).await.unwrap();
        assert_eq!(
            service.calls(),
            vec![NewsCall::Breaking, NewsCall::Search("world".into())]
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_message() {
        let handler = NewsHandler::new(Arc::new(MockNewsService::with_headlines(vec![])));
        let out = handler
            .execute(&news(NewsScope::Country("japan".into())))
            .await
            .unwrap();
        assert!(out.text.starts_with("No recent news found for japan"));
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let handler = NewsHandler::new(Arc::new(MockNewsService::failing(NewsError::Timeout)));
        let err = handler.execute(&news(NewsScope::Breaking)).await.unwrap_err();
        assert!(matches!(err, ToolError::News(NewsError::Timeout)));
    }
}
