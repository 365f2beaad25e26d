//! HTTP server for the booking service.
//!
//! Exposes the saga entry point (`POST /bookings`), reservation lookups,
//! room suggestions, and health/metrics, with structured logging (tracing)
//! and Prometheus metrics. Responses from `POST /bookings` always carry a
//! terminal reservation status: `CONFIRMED` or `CANCELLED`.

pub mod config;
pub mod correlation;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use booking::{HotelGateway, ReservationStore, SagaOrchestrator};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::bookings::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, G>(state: Arc<AppState<S, G>>, metrics_handle: PrometheusHandle) -> Router
where
    S: ReservationStore + 'static,
    G: HotelGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/bookings", post(routes::bookings::create::<S, G>))
        .route(
            "/bookings/suggestions",
            get(routes::bookings::suggestions::<S, G>),
        )
        .route("/bookings/{id}", get(routes::bookings::get::<S, G>))
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

/// Creates application state over the given store and gateway.
pub fn create_state<S, G>(store: S, gateway: G) -> Arc<AppState<S, G>>
where
    S: ReservationStore,
    G: HotelGateway,
{
    Arc::new(AppState {
        orchestrator: Arc::new(SagaOrchestrator::new(store, gateway)),
    })
}
