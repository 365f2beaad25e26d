//! Identifier types shared by the booking and hotel services.

pub mod types;

pub use types::{CorrelationId, LockId, RequestId, ReservationId, RoomId, UserId};
