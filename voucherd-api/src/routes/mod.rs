//! REST API Routes Module
//!
//! Two route families:
//! - Ledger routes: cached snapshot reads, voucher writes, batch submit
//! - Health check endpoints (Kubernetes-compatible)
//!
//! CORS defaults to allow-all for development; configured origins
//! lock it down.

pub mod health;
pub mod ledger;

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::state::AppState;

/// Assemble the full API router.
pub fn create_api_router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .nest("/cache", ledger::create_router(state.clone()))
        .nest("/batch", ledger::create_batch_router(state.clone()))
        .nest("/health", health::create_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config))
}

/// Build the CORS layer.
///
/// Empty origins means development mode: allow all. Otherwise only
/// the configured origins are allowed.
fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::HeaderName::from_static("x-cache")])
        .max_age(Duration::from_secs(3600));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: development mode, allowing all origins");
        cors.allow_origin(Any).allow_headers(Any).expose_headers(Any)
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS: restricting to configured origins");
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
