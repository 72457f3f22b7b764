//! HTTP adapter around the scoring pipeline

pub mod error;
pub mod handlers;

pub use error::{ApiError, ApiResult};

use crate::config::ServerConfig;
use crate::metrics::ServiceMetrics;
use crate::pipeline::ScoringPipeline;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ScoringPipeline>,
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(pipeline: ScoringPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            metrics: Arc::new(ServiceMetrics::new()),
        }
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(TraceLayer::new_for_http());

    let router = if server.cors_allow_any_origin {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
