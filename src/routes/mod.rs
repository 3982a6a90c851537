//! API Routes
//!
//! This module organizes all HTTP endpoints for the relay:
//! - `/api/analyze` - Submit an image, poll a job
//! - `/api/enrichment` - Europeana and Met Museum proxies
//! - `/api/health` - Health checks

pub mod analyze;
pub mod enrichment;
pub mod health;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;
use crate::middleware::apply_cors;
use crate::models::AppState;
use tracing::info;

/// Create the main application router
///
/// Base64 images are large, so the body limit comes from configuration
/// instead of axum's 2 MB default.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let body_limit = state.config.server.max_body_bytes;

    let router = Router::new()
        .merge(analyze::router(state.clone()))
        .merge(enrichment::router(state.clone()))
        .merge(health::router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http());

    apply_cors(router)
}
