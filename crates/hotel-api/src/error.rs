//! API error type with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hotel::HotelError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Lock engine or store error.
    Hotel(HotelError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Hotel(err) => hotel_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn hotel_error_to_response(err: HotelError) -> (StatusCode, String) {
    match &err {
        HotelError::InvalidDates(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        HotelError::RoomNotFound(_) | HotelError::LockNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        HotelError::RoomUnavailable(_)
        | HotelError::DateConflict(_)
        | HotelError::AlreadyReleased(_)
        | HotelError::HoldExpired(_)
        | HotelError::InvalidTransition { .. }
        | HotelError::DuplicateRequest(_) => (StatusCode::CONFLICT, err.to_string()),
        HotelError::InvalidStatus(_) | HotelError::Database(_) | HotelError::Migration(_) => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<HotelError> for ApiError {
    fn from(err: HotelError) -> Self {
        ApiError::Hotel(err)
    }
}
