//! Plaza engine entry point

use std::sync::Arc;

use anyhow::Context;

use plaza_engine::config::EngineConfig;
use plaza_engine::persistence::SqliteGateway;
use plaza_engine::state::AppState;
use plaza_engine::websocket;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("info,plaza_engine=debug,tower_http=debug")
                }),
        )
        .init();

    let config = EngineConfig::from_env();
    tracing::info!(
        database_url = %config.database_url,
        addr = %config.bind_addr(),
        "Starting Plaza engine"
    );

    let gateway = SqliteGateway::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    let state = Arc::new(AppState::new(Arc::new(gateway), config.persistence_timeout));

    let app = websocket::router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    tracing::info!(addr = %config.bind_addr(), "Listening for WebSocket connections on /ws");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
