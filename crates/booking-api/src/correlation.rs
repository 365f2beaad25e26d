//! Correlation-id middleware.
//!
//! Echoes an inbound `X-Correlation-Id` on the response, generating one
//! when absent. Note the saga itself assigns each reservation a fresh
//! correlation id at entry and propagates that one to the hotel service;
//! this middleware only ties the client-facing request and response logs
//! together.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use common::CorrelationId;

/// Header carrying the correlation id across services.
pub const CORRELATION_HEADER: &str = "X-Correlation-Id";

/// Axum middleware: attach a [`CorrelationId`] to the request and response.
pub async fn propagate_correlation_id(mut request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(CorrelationId::from_header)
        .unwrap_or_else(|| CorrelationId::generate("booking"));

    request.extensions_mut().insert(correlation_id.clone());
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}
