use crate::api::{handlers, AppState};
use axum::{routing::get, Router};
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        // Metrics
        .route("/metrics", get(handlers::metrics))
        // Product search
        .route("/api/v1/search", get(handlers::search_products))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
}
