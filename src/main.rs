mod config;
mod models;
mod routes;
mod services;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::upstream::UpstreamClient;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub upstream: UpstreamClient,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_normalizer=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting Media Normalizer v{}", env!("CARGO_PKG_VERSION"));

    let upstream = UpstreamClient::from_config(&config)?;
    tracing::info!(
        "Upstream: {} (timeout {}ms, season probe {:?})",
        upstream.base_url(),
        config.fetch_timeout_ms,
        config.season_probe
    );

    // Build application state
    let state = Arc::new(AppState {
        config,
        upstream,
        start_time: Instant::now(),
    });

    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
