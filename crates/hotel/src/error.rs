use common::{RequestId, RoomId};
use thiserror::Error;

use crate::lock::LockStatus;

/// Errors that can occur in the lock engine and its stores.
#[derive(Debug, Error)]
pub enum HotelError {
    /// The requested stay dates are malformed or in the past.
    #[error("invalid stay dates: {0}")]
    InvalidDates(String),

    /// No room exists with the given id.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// The room exists but is flagged unavailable for booking.
    #[error("room {0} is not available for booking")]
    RoomUnavailable(RoomId),

    /// An active lock already covers an overlapping interval on this room.
    #[error("room {0} is already locked for the requested dates")]
    DateConflict(RoomId),

    /// No lock exists for the given request id.
    #[error("no lock found for request {0}")]
    LockNotFound(RequestId),

    /// The hold was already released; it cannot be confirmed.
    #[error("hold for request {0} was already released")]
    AlreadyReleased(RequestId),

    /// The hold expired before it could be confirmed.
    #[error("hold for request {0} has expired")]
    HoldExpired(RequestId),

    /// The lock is in a status that disallows the requested transition.
    #[error("lock for request {request_id} is {status}, cannot {operation}")]
    InvalidTransition {
        request_id: RequestId,
        status: LockStatus,
        operation: &'static str,
    },

    /// Another insert with the same request id won the race.
    /// Callers resolve this by re-reading the winning row.
    #[error("a lock for request {0} already exists")]
    DuplicateRequest(RequestId),

    /// A persisted status column holds a value the engine does not know.
    #[error("invalid lock status in storage: {0}")]
    InvalidStatus(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for hotel operations.
pub type Result<T> = std::result::Result<T, HotelError>;
