use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use crate::artifacts::{self, WIDE_INDENT};
use crate::config::FetchConfig;
use crate::error::{AppError, Result};
use crate::models::{ContentMap, ErrorRecord, PageContent, PageRecord};

// Rotated per request
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

// Create static selectors to avoid recompiling them each time
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("title").expect("Failed to parse title selector")
});
static META_DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("Failed to parse meta selector")
});
static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1").expect("Failed to parse h1 selector")
});
static H2_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h2").expect("Failed to parse h2 selector")
});
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p").expect("Failed to parse paragraph selector")
});

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Fetches pages one at a time and pulls out their structural text.
pub struct ContentExtractor {
    client: Client,
    delay: Duration,
}

impl ContentExtractor {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            delay: config.delay,
        })
    }

    /// Extracts every URL and writes the resulting map to `output`.
    ///
    /// A failing URL gets an error record; it never stops the batch. Only a
    /// failure to write `output` is returned as an error.
    pub async fn extract(&self, urls: &[String], output: &Path) -> Result<ContentMap> {
        let mut extracted = ContentMap::new();

        for url in urls {
            if extracted.contains_key(url) {
                debug!("Skipping duplicate URL {}", url);
                continue;
            }

            let record = match self.fetch_page(url).await {
                Ok(page) => {
                    info!("Successfully extracted content from {}", url);
                    PageRecord::Extracted(page)
                }
                Err(e) => {
                    error!("Error processing {}: {}", url, e);
                    PageRecord::Failed(ErrorRecord::new(e.to_string()))
                }
            };
            extracted.insert(url.clone(), record);

            // Be polite with delays
            tokio::time::sleep(self.delay).await;
        }

        artifacts::write_json(output, &extracted, WIDE_INDENT).await?;
        Ok(extracted)
    }

    pub async fn fetch_page(&self, url: &str) -> std::result::Result<PageContent, ExtractError> {
        let parsed = Url::parse(url).map_err(|source| ExtractError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let html = self
            .client
            .get(parsed.clone())
            .header(USER_AGENT, random_user_agent())
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(CONNECTION, "keep-alive")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(parse_page(&html, &parsed))
    }
}

fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Parses an HTML document into a [`PageContent`].
pub fn parse_page(html: &str, url: &Url) -> PageContent {
    let document = Html::parse_document(html);

    PageContent {
        title: document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|title| element_text(&title)),
        meta_description: document
            .select(&META_DESCRIPTION_SELECTOR)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .map(str::to_string),
        h1_headers: document.select(&H1_SELECTOR).map(|h| element_text(&h)).collect(),
        h2_headers: document.select(&H2_SELECTOR).map(|h| element_text(&h)).collect(),
        paragraphs: document
            .select(&PARAGRAPH_SELECTOR)
            .map(|p| element_text(&p))
            .filter(|text| !text.is_empty())
            .collect(),
        domain: url.authority().to_string(),
    }
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
