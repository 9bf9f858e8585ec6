//! HTTP API server for the finance tracker.
//!
//! Exposes registration, category, and transaction use cases as JSON
//! endpoints, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use application::MessageSender;
use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Backend;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B: Backend>(state: Arc<AppState<B>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<B>))
        .route("/users", post(routes::users::register::<B>))
        .route(
            "/users/{provider}/{external_id}",
            get(routes::users::get::<B>),
        )
        .route(
            "/users/{provider}/{external_id}/categories/default",
            post(routes::users::create_default_categories::<B>),
        )
        .route("/categories", get(routes::categories::list::<B>))
        .route("/transactions", post(routes::transactions::record::<B>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `backend`, with the standard event
/// subscribers and welcome messages going to `sender`.
pub fn create_default_state<B: Backend>(
    backend: B,
    sender: Arc<dyn MessageSender>,
    request_timeout: Duration,
) -> Arc<AppState<B>> {
    Arc::new(AppState::new(backend, sender, request_timeout))
}
