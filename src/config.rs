use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use crate::error::{AppError, Result};
use crate::tokens::DEFAULT_MAX_PROMPT_TOKENS;

/// Search provider settings.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub endpoint: String,
    pub max_results: usize,
    pub delay: Duration,
    pub timeout: Duration,
    pub country: String,
    pub language: String,
}

/// Page fetch settings for the content extractor.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub delay: Duration,
}

/// Language model and prompt settings.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub story_language: String,
    pub max_prompt_tokens: usize,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub search: SearchConfig,
    pub fetch: FetchConfig,
    pub llm: LlmConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("OPENAI_API_KEY environment variable is required".to_string()))?;

        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = get("HOST", "127.0.0.1");
        let port = parse::<u16>("PORT", &get("PORT", "8000"))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let search = SearchConfig {
            endpoint: get("SEARCH_ENDPOINT", "https://html.duckduckgo.com/html/"),
            max_results: parse("MAX_RESULTS", &get("MAX_RESULTS", "10"))?,
            delay: Duration::from_secs(parse("SEARCH_DELAY", &get("SEARCH_DELAY", "2"))?),
            timeout: Duration::from_secs(parse("SEARCH_TIMEOUT", &get("SEARCH_TIMEOUT", "10"))?),
            country: get("SEARCH_COUNTRY", "IN"),
            language: get("SEARCH_LANGUAGE", "en"),
        };

        let fetch = FetchConfig {
            timeout: Duration::from_secs(parse("FETCH_TIMEOUT", &get("FETCH_TIMEOUT", "30"))?),
            delay: Duration::from_secs(parse("FETCH_DELAY", &get("FETCH_DELAY", "2"))?),
        };

        let llm = LlmConfig {
            api_key,
            base_url: get("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            model: get("LLM_MODEL", "gpt-4o-mini"),
            temperature: parse("LLM_TEMPERATURE", &get("LLM_TEMPERATURE", "0.1"))?,
            story_language: get("STORY_LANGUAGE", "Hindi"),
            max_prompt_tokens: parse("MAX_PROMPT_TOKENS", &get("MAX_PROMPT_TOKENS", &DEFAULT_MAX_PROMPT_TOKENS.to_string()))?,
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            data_dir: PathBuf::from(get("DATA_DIR", "data")),
            search,
            fetch,
            llm,
        })
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e)))
}
