//! HTTP server for the hotel service.
//!
//! Exposes the lock surface consumed by the booking saga
//! (`POST /rooms/{room_id}/hold|confirm|release`), room listings for
//! suggestions, and health/metrics, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod correlation;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use hotel::{HotelStore, LockEngine};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::rooms::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: HotelStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/rooms", get(routes::rooms::list::<S>))
        .route("/rooms/{room_id}", get(routes::rooms::get::<S>))
        .route("/rooms/{room_id}/hold", post(routes::rooms::hold::<S>))
        .route("/rooms/{room_id}/confirm", post(routes::rooms::confirm::<S>))
        .route("/rooms/{room_id}/release", post(routes::rooms::release::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(axum::middleware::from_fn(
            correlation::propagate_correlation_id,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given store.
pub fn create_state<S: HotelStore + Clone>(store: S, config: &Config) -> Arc<AppState<S>> {
    let engine = LockEngine::new(store, chrono::Duration::minutes(config.hold_ttl_minutes));
    Arc::new(AppState { engine })
}
