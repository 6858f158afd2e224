//! Edge Inference Endpoint
//!
//! Main entry point: configuration, component wiring, startup/shutdown
//! sequencing and the HTTP server.

use edge_inference::{camera, config::AppConfig, detector, state::AppState, web_api};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edge_inference=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting edge inference endpoint v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (single construction point)
    let config = AppConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        autostart_camera = config.autostart_camera,
        camera_size = %format!("{}x{}", config.camera.width, config.camera.height),
        model_path = %config.model.path_display(),
        model_autoload = config.model.autoload,
        "Configuration loaded"
    );

    // Probe the external stacks and wire up the component graph
    let driver = camera::probe_driver();
    let runtime = detector::probe_runtime();
    let state = AppState::new(config, driver, runtime);

    // Startup sequencing: camera autostart and model autoload are independent
    state.orchestrator.startup().await?;

    let app = web_api::create_router(state.clone())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Shutdown sequencing: release the camera unconditionally
    tracing::info!("Shutting down edge inference endpoint");
    state.orchestrator.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install ctrl-c handler");
    }
}
