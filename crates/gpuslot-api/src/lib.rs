//! gpuslot-api: HTTP API server for gpuslot
//!
//! This crate exposes the scheduler over REST:
//! - GPU listing with current occupancy
//! - Reservation listing, creation and cancellation
//! - Availability queries over a time window

pub mod rest;

pub use rest::{create_router, ApiError, ErrorResponse};

use axum::http::HeaderValue;
use axum::Router;
use gpuslot_core::ApiConfig;
use gpuslot_scheduler::Scheduler;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete application: routes mounted under the configured prefix,
/// request tracing and, when enabled, CORS
pub fn build_app(scheduler: Arc<Scheduler>, config: &ApiConfig) -> Router {
    let routes = create_router(scheduler);
    let prefix = config.prefix.trim_matches('/');

    let mut app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(&format!("/{}", prefix), routes)
    };

    if config.cors_enabled {
        app = app.layer(cors_layer(&config.cors_origins));
    }

    app.layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins = origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok());
    layer.allow_origin(AllowOrigin::list(origins))
}
