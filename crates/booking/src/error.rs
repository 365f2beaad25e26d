use common::{RequestId, ReservationId};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors surfaced by the booking service core.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The requested stay dates are malformed or in the past.
    #[error("invalid reservation dates: {0}")]
    InvalidDates(String),

    /// A reservation with this idempotency key already exists.
    /// Callers resolve this by re-reading the winning row.
    #[error("a reservation for request {0} already exists")]
    DuplicateRequest(RequestId),

    /// No reservation exists with the given id.
    #[error("reservation not found: {0}")]
    NotFound(ReservationId),

    /// The hotel gateway failed definitively.
    ///
    /// Inside the saga these are handled by compensation and never escape;
    /// they only surface from operations outside the saga, such as room
    /// suggestions.
    #[error("hotel gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A persisted status column holds a value the saga does not know.
    #[error("invalid reservation status in storage: {0}")]
    InvalidStatus(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;
