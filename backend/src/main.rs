//! Kitchen Ledger - Backend Server

use std::net::SocketAddr;

use kitchen_ledger_backend::{create_app, AppError, AppState, Config, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing; KL_LOG_JSON=true switches to JSON lines
    let json_logs = std::env::var("KL_LOG_JSON").map_or(false, |v| v == "true");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "kl_server=debug,kitchen_ledger_backend=debug,tower_http=debug".into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // Load configuration
    let config = Config::load().map_err(|e| AppError::Configuration(e.to_string()))?;

    tracing::info!("Starting Kitchen Ledger Server");
    tracing::info!("Environment: {}", config.environment);

    let store = Store::open(&config).await?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState::new(store, config);
    let store = state.store.clone();
    let app = create_app(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
