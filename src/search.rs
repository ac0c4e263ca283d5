//! Search adapter: turns a query into a ranked list of result URLs.
//!
//! Provider failures never reach the caller. An empty list means either
//! "no results" or "search failed".

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use crate::config::SearchConfig;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static RESULT_LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a.result__a").expect("Failed to parse result link selector")
});

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("search provider returned HTTP {0}")]
    Status(u16),

    #[error("could not build search client: {0}")]
    Client(String),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns result URLs in provider rank order, at most `limit` of them.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError>;

    fn name(&self) -> &'static str;
}

/// Scrapes the DuckDuckGo HTML endpoint (no API key needed).
pub struct DuckDuckGoProvider {
    client: Client,
    endpoint: String,
    region: String,
}

impl DuckDuckGoProvider {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| SearchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            region: format!("{}-{}", config.country, config.language).to_lowercase(),
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query), ("kl", self.region.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        Ok(parse_result_links(&html, limit))
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}

/// Pulls result URLs out of a DuckDuckGo HTML result page.
pub fn parse_result_links(html: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT_LINK_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(resolve_result_href)
        .take(limit)
        .collect()
}

/// Unwraps `//duckduckgo.com/l/?uddg=<target>` redirects. Direct http(s)
/// links pass through; anything else is dropped.
fn resolve_result_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    let is_redirect = parsed.host_str().is_some_and(|h| h.ends_with("duckduckgo.com"))
        && parsed.path().starts_with("/l/");

    if is_redirect {
        return parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned())
            .filter(|target| target.starts_with("http"));
    }

    match parsed.scheme() {
        "http" | "https" if !parsed.host_str().is_some_and(|h| h.ends_with("duckduckgo.com")) => Some(absolute),
        _ => None,
    }
}

/// Collects provider results with a fixed pause between them.
pub struct Searcher {
    provider: Box<dyn SearchProvider>,
    delay: Duration,
}

impl Searcher {
    pub fn new(provider: Box<dyn SearchProvider>, delay: Duration) -> Self {
        Self { provider, delay }
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Vec<String> {
        if max_results == 0 {
            return Vec::new();
        }

        info!("Searching {} for: {}", self.provider.name(), query);
        let results = match self.provider.search(query, max_results).await {
            Ok(results) => results,
            Err(e) => {
                error!("Error during search: {}", e);
                return Vec::new();
            }
        };

        let mut urls = Vec::with_capacity(max_results.min(results.len()));
        for url in results {
            debug!("Search result #{}: {}", urls.len() + 1, url);
            urls.push(url);
            if urls.len() >= max_results {
                break;
            }
            // Rate limiting between results
            tokio::time::sleep(self.delay).await;
        }

        info!("Search returned {} URLs", urls.len());
        urls
    }
}
