//! Reservation saga for the booking service.
//!
//! A reservation is driven to a terminal status by a two-step saga against
//! the hotel service: `hold` blocks the room's date interval, `confirm`
//! commits it. Any forward failure triggers the compensating `release`;
//! whether or not compensation succeeds, the reservation ends `CANCELLED`
//! (the hotel side's expiration sweeper backstops a lost release).
//!
//! Idempotency is keyed by the client-supplied `request_id` on both sides,
//! which makes the end-to-end operation safe against arbitrary client and
//! network retries.

pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod orchestrator;
pub mod postgres;
pub mod reservation;
pub mod store;

pub use common::{CorrelationId, RequestId, ReservationId, RoomId, UserId};
pub use error::{BookingError, Result};
pub use gateway::{GatewayError, HotelGateway, InMemoryHotelGateway, LockSnapshot, RoomSummary};
pub use http::{HotelGatewayConfig, HttpHotelGateway};
pub use memory::InMemoryReservationStore;
pub use orchestrator::{NewReservation, SagaOrchestrator};
pub use postgres::PostgresReservationStore;
pub use reservation::{Reservation, ReservationStatus};
pub use store::ReservationStore;
