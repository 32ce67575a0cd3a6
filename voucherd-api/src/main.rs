//! voucherd API Server Entry Point
//!
//! Bootstraps configuration, wires the ledger client into the
//! snapshot cache, and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tracing_subscriber::EnvFilter;
use voucherd_api::{
    create_api_router, ApiError, ApiResult, AppConfig, AppState, LedgerClient, Notifier,
};
use voucherd_cache::{CacheConfig, SnapshotCache};

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let ledger = LedgerClient::new(config.ledger_url.clone());
    let cache_config = CacheConfig::default()
        .with_ttl(config.cache_ttl)
        .with_fetch_timeout(config.fetch_timeout);
    let cache = SnapshotCache::new(Arc::new(ledger.clone()), cache_config);

    let notifier = config
        .telegram
        .clone()
        .map(|telegram| Arc::new(Notifier::new(telegram)));
    if notifier.is_none() {
        tracing::info!("Telegram credentials not set; transaction alerts disabled");
    }

    let state = AppState::new(cache, Arc::new(ledger), notifier);
    let app: Router = create_api_router(state, &config);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, ledger = %config.ledger_url, "Starting voucherd API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("VOUCHERD_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("VOUCHERD_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
