use tokio::net::TcpListener;
use tracing::info;
use story_writer::{
    artifacts,
    config::Config,
    api::routes::create_router,
    telemetry,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_telemetry();

    // Load configuration; a missing API key stops startup here
    let config = Config::load()?;
    let server_addr = config.server_addr;

    artifacts::ensure_dir(&config.data_dir).await?;
    info!("Artifacts will be written to {}", config.data_dir.display());

    // Create application state
    let app_state = AppState::new(config)?;

    // Build the router with routes
    let app = create_router(app_state);

    // Create the listener
    let listener = TcpListener::bind(server_addr).await?;

    // Start the server
    info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
