use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use golfrun_api::config::ServerConfig;
use golfrun_api::router::build_app_router;
use golfrun_api::state::AppState;
use golfrun_cloud::CloudRunClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "golfrun_api=debug,golfrun_cloud=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        region = %config.job.region,
        job = %config.job.job_name,
        await_execution = config.await_execution,
        "Loaded server configuration"
    );
    if config.job.project_id.is_none() {
        tracing::warn!("PROJECT_ID is not set; every dispatch will fail until it is");
    }

    // --- Job runner ---
    let runner = CloudRunClient::from_config(config.cloud_run_config(), config.access_token.clone())
        .expect("Failed to build Cloud Run client");
    tracing::info!(endpoint = %runner.config().endpoint, "Cloud Run client created");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        runner: Arc::new(runner),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM. Cloud Run sends SIGTERM before
/// stopping an instance.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
