//! API error type with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use booking::{BookingError, GatewayError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
    /// Booking core error.
    Booking(BookingError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Booking(err) => booking_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn booking_error_to_response(err: BookingError) -> (StatusCode, String) {
    match &err {
        BookingError::InvalidDates(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        BookingError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        BookingError::DuplicateRequest(_) => (StatusCode::CONFLICT, err.to_string()),
        // only surfaces from non-saga operations such as suggestions
        BookingError::Gateway(GatewayError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        BookingError::Gateway(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        BookingError::InvalidStatus(_) | BookingError::Database(_) | BookingError::Migration(_) => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::Booking(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::RequestId;

    fn status_for(err: BookingError) -> StatusCode {
        booking_error_to_response(err).0
    }

    #[test]
    fn error_status_mapping() {
        assert_eq!(
            status_for(BookingError::InvalidDates("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(BookingError::DuplicateRequest(RequestId::generate())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(BookingError::Gateway(GatewayError::Unavailable(
                "503".into()
            ))),
            StatusCode::BAD_GATEWAY
        );
    }
}
