//! Room inventory and the reservation lock engine for the hotel service.
//!
//! The lock engine is the concurrency-control half of the distributed
//! reservation saga: `hold` blocks a date interval on a room, `confirm`
//! promotes the hold to a committed booking, `release` is the saga's
//! compensating action, and the sweeper expires stale holds so that a
//! crashed booking service can never block a room forever.
//!
//! The central invariant: for any room, locks in the `HELD` or `CONFIRMED`
//! status form a non-overlapping family of half-open `[start, end)` date
//! intervals.

pub mod engine;
pub mod error;
pub mod lock;
pub mod memory;
pub mod postgres;
pub mod room;
pub mod store;
pub mod sweeper;

pub use common::{CorrelationId, LockId, RequestId, RoomId};
pub use engine::LockEngine;
pub use error::{HotelError, Result};
pub use lock::{LockStatus, RoomLock};
pub use memory::InMemoryHotelStore;
pub use postgres::PostgresHotelStore;
pub use room::Room;
pub use store::HotelStore;
pub use sweeper::{ExpirationSweeper, SweepReport};
