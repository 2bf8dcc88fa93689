mod api;
mod config;
mod error;
mod fallback;
mod fetcher;
mod parser;
mod retry;
mod scrape;
mod state;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::build_source;
use crate::scrape::ScrapeService;
use crate::state::MemoryCache;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let source = build_source(&cfg)?;
    info!(
        method = %source.method(),
        url = %cfg.target_url,
        ttl_secs = cfg.cache_ttl.as_secs(),
        max_attempts = cfg.retry.max_attempts,
        backoff = ?cfg.retry.backoff,
        "Scrape pipeline configured",
    );

    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());
    let service = ScrapeService::new(
        source,
        Arc::new(MemoryCache::new(cfg.cache_ttl)),
        cfg.retry,
        Arc::clone(&health),
        Arc::clone(&latency),
    );

    let app = router(ApiState {
        service,
        health,
        latency,
    });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
