use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marquee::config::Config;
use marquee::db::Database;
use marquee::{api, lifecycle, AppState};

fn init_tracing() {
    // RUST_LOG controls log levels.
    // Default: debug for our crate, info for axum, warn for dependencies
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("marquee=debug,tower_http=debug,axum=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing first so we can log configuration loading
    init_tracing();

    tracing::info!("Starting Marquee Backend v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().context("failed to load configuration")?;
    tracing::debug!("Server: {}:{}", config.server.host, config.server.port);
    tracing::debug!("Database: {:?}", config.database.path);

    // Ensure database directory exists
    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create database directory {:?}", parent))?;
        }
    }

    let db = Database::open(&config.database.path).context("failed to open database")?;
    tracing::info!("Database opened at {:?}", config.database.path);

    let addr = config.server_addr();
    let state = AppState::from_config(config, db).context("failed to build application state")?;

    lifecycle::startup(&state).await.context("startup failed")?;

    let app = api::router(state.clone());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Marquee Backend listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    lifecycle::shutdown(&state).await.context("shutdown failed")?;
    Ok(())
}
