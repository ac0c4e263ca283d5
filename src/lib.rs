pub mod api;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod models;
pub mod search;
pub mod story;
pub mod telemetry;
pub mod tokens;

use std::sync::Arc;
use config::Config;
use error::{AppError, Result};
use extractor::ContentExtractor;
use search::{DuckDuckGoProvider, Searcher};
use story::StoryGenerator;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub searcher: Arc<Searcher>,
    pub extractor: Arc<ContentExtractor>,
    pub generator: Arc<StoryGenerator>,
}

impl AppState {
    /// Wires the pipeline components from the loaded configuration.
    pub fn new(config: Config) -> Result<Self> {
        let provider = DuckDuckGoProvider::new(&config.search)
            .map_err(|e| AppError::ConfigError(e.to_string()))?;

        Ok(Self {
            searcher: Arc::new(Searcher::new(Box::new(provider), config.search.delay)),
            extractor: Arc::new(ContentExtractor::new(&config.fetch)?),
            generator: Arc::new(StoryGenerator::new(&config.llm)),
            config: Arc::new(config),
        })
    }
}
