//! Storage trait for rooms and room locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{RequestId, RoomId};

use crate::Result;
use crate::lock::{LockStatus, RoomLock};
use crate::room::Room;

/// Persistence seam for the hotel service.
///
/// Implementations must uphold two guarantees the engine relies on:
///
/// 1. `insert_lock_if_vacant` serializes the conflict probe and the insert
///    per room, so two concurrent overlapping holds can never both succeed.
/// 2. The transition methods (`confirm_lock`, `release_lock`,
///    `expire_due_locks`) are conditional writes: they update a row only if
///    its current status still matches the precondition, and report whether
///    they did. Callers re-read and re-classify after a miss.
#[async_trait]
pub trait HotelStore: Send + Sync {
    // -- rooms --

    /// Inserts a room.
    async fn insert_room(&self, room: Room) -> Result<Room>;

    /// Looks up a room by id.
    async fn get_room(&self, room_id: RoomId) -> Result<Option<Room>>;

    /// Returns all rooms.
    async fn list_rooms(&self) -> Result<Vec<Room>>;

    /// Bumps a room's `times_booked` counter by one.
    async fn increment_times_booked(&self, room_id: RoomId) -> Result<()>;

    // -- locks --

    /// Looks up a lock by its idempotency key.
    async fn find_lock(&self, request_id: &RequestId) -> Result<Option<RoomLock>>;

    /// Inserts a new `Held` lock unless an active lock on the same room
    /// overlaps its interval.
    ///
    /// Fails with [`crate::HotelError::DateConflict`] on overlap and with
    /// [`crate::HotelError::DuplicateRequest`] when a row with the same
    /// `request_id` already exists (a concurrent duplicate lost the race).
    async fn insert_lock_if_vacant(&self, lock: RoomLock) -> Result<RoomLock>;

    /// Transitions a lock from `Held` to `Confirmed`, provided it is still
    /// `Held` and its deadline has not passed at `now`.
    ///
    /// Returns the updated row, or `None` if the precondition no longer
    /// held.
    async fn confirm_lock(
        &self,
        request_id: &RequestId,
        now: DateTime<Utc>,
    ) -> Result<Option<RoomLock>>;

    /// Transitions a lock from `Held` to `Released`.
    ///
    /// Returns the updated row, or `None` if the lock was no longer `Held`.
    async fn release_lock(
        &self,
        request_id: &RequestId,
        now: DateTime<Utc>,
    ) -> Result<Option<RoomLock>>;

    /// Transitions every `Held` lock whose deadline has passed to `Expired`
    /// and returns the rows that were transitioned.
    async fn expire_due_locks(&self, now: DateTime<Utc>) -> Result<Vec<RoomLock>>;

    /// Deletes `Released` and `Expired` locks last touched before `cutoff`.
    /// Returns the number of rows removed.
    async fn purge_terminal_locks_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Returns all locks for a room, any status.
    async fn locks_for_room(&self, room_id: RoomId) -> Result<Vec<RoomLock>>;

    /// Returns the number of locks per status, for observability.
    async fn count_locks_by_status(&self) -> Result<Vec<(LockStatus, u64)>>;
}
