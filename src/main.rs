//! Assessment Timer - countdown and auto-submit service for timed assessments
//!
//! This is the main entry point for the assessment-timer server.

use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::info;

use assessment_timer::{
    api::create_router,
    config::Config,
    services::HttpSubmitter,
    state::AppState,
    tasks::session_reaper_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("assessment_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting assessment-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, api_url={}, landing_path={}, notice={}s",
        config.host, config.port, config.api_url, config.landing_path, config.notice_seconds
    );

    let submitter = Arc::new(HttpSubmitter::new(
        config.api_url.clone(),
        config.credentials(),
        config.submit_timeout(),
    )?);
    let state = Arc::new(
        AppState::new(config.port, config.host.clone(), submitter, config.session_settings())
            .with_retention(config.retention()),
    );

    // Start background tasks
    tokio::spawn(session_reaper_task(Arc::clone(&state), Duration::from_secs(30)));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /sessions            - Mount a countdown");
    info!("  GET    /sessions            - List countdowns");
    info!("  GET    /sessions/:id        - Countdown view");
    info!("  POST   /sessions/:id/pause  - Pause a countdown");
    info!("  POST   /sessions/:id/resume - Resume a countdown");
    info!("  DELETE /sessions/:id        - Unmount a countdown");
    info!("  GET    /sessions/:id/events - Server-Sent Events stream");
    info!("  GET    /status              - Service status");
    info!("  GET    /health              - Health check");

    // Open event streams never finish on their own, so stop on the signal
    // instead of waiting for connections to drain
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
