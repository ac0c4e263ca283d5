use axum::{
    routing::{get, post},
    Router,
    extract::{rejection::JsonRejection, Json, State},
};
use chrono::Local;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::artifacts::{self, ArtifactSession, WIDE_INDENT};
use crate::error::{Result, AppError};
use crate::api::models::{SearchQuery, WelcomeResponse};
use crate::models::{RawSearchRecord, StoryMap};
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/v1/fetch-websites", post(fetch_websites_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn root_handler() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to Story Writer API".to_string(),
    })
}

async fn fetch_websites_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<SearchQuery>, JsonRejection>,
) -> Result<Json<StoryMap>> {
    let Json(req) = body.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    info!("Processing request for query: {}", req.query);
    let start_time = std::time::Instant::now();

    let result = process_fetch_request(&state, &req).await;

    info!("Request processing took: {:?}", start_time.elapsed());
    result.map(Json)
}

/// Runs search, extraction and generation in order, writing an artifact
/// after each step.
async fn process_fetch_request(state: &AppState, req: &SearchQuery) -> Result<StoryMap> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidRequest("query must not be empty".to_string()));
    }

    artifacts::ensure_dir(&state.config.data_dir).await?;
    let session = ArtifactSession::new(&state.config.data_dir, Local::now());

    // Step 1: search
    let urls = state
        .searcher
        .search(query, state.config.search.max_results)
        .await;
    let raw = RawSearchRecord {
        query: query.to_string(),
        timestamp: session.timestamp().to_string(),
        urls,
    };
    artifacts::write_json(&session.raw_path(), &raw, WIDE_INDENT).await?;

    // Step 2: extract
    let content = state
        .extractor
        .extract(&raw.urls, &session.content_path())
        .await?;

    // Step 3: generate
    let stories = state
        .generator
        .generate(query, &content, &session.story_path())
        .await?;

    info!("Request completed for query: {} ({} entries)", query, stories.len());
    Ok(stories)
}
