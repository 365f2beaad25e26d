//! Storage trait for reservations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{RequestId, ReservationId};

use crate::Result;
use crate::reservation::{Reservation, ReservationStatus};

/// Persistence seam for the booking service.
///
/// The unique index on `request_id` is what makes `insert_pending`
/// at-most-once under concurrency: of two racing inserts with the same key,
/// exactly one succeeds and the loser gets
/// [`crate::BookingError::DuplicateRequest`].
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Looks up a reservation by its idempotency key.
    async fn find_by_request_id(&self, request_id: &RequestId) -> Result<Option<Reservation>>;

    /// Looks up a reservation by id.
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// Inserts a new `Pending` reservation.
    ///
    /// Fails with [`crate::BookingError::DuplicateRequest`] when a row with
    /// the same `request_id` already exists.
    async fn insert_pending(&self, reservation: Reservation) -> Result<Reservation>;

    /// Writes the terminal status if the reservation is still `Pending`;
    /// otherwise leaves the row untouched. Returns the row as persisted, so
    /// a lost race still yields the canonical terminal outcome.
    async fn complete(
        &self,
        id: ReservationId,
        status: ReservationStatus,
        now: DateTime<Utc>,
    ) -> Result<Reservation>;
}
