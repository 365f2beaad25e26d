//! Lock engine: hold, confirm, and release with idempotency by request id.

use chrono::{Duration, NaiveDate, Utc};
use common::{CorrelationId, RequestId, RoomId};

use crate::lock::{LockStatus, RoomLock};
use crate::store::HotelStore;
use crate::{HotelError, Result};

/// Default hold lifetime before the sweeper may expire it.
pub const DEFAULT_HOLD_TTL_MINUTES: i64 = 15;

/// Drives the per-lock state machine over a [`HotelStore`].
///
/// All three operations are idempotent by `request_id`: re-applying an
/// operation after it has succeeded returns the current row without further
/// state change. Transitions are conditional store writes; when a write
/// loses a race the engine re-reads the row and classifies the outcome
/// again, so concurrent callers always observe a consistent answer.
#[derive(Clone)]
pub struct LockEngine<S> {
    store: S,
    hold_ttl: Duration,
}

impl<S: HotelStore> LockEngine<S> {
    /// Creates an engine with the given hold lifetime.
    pub fn new(store: S, hold_ttl: Duration) -> Self {
        Self { store, hold_ttl }
    }

    /// Creates an engine with the default 15-minute hold lifetime.
    pub fn with_default_ttl(store: S) -> Self {
        Self::new(store, Duration::minutes(DEFAULT_HOLD_TTL_MINUTES))
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places a hold on a room for the half-open interval
    /// `[start_date, end_date)`.
    ///
    /// If a lock already exists for `request_id` it is returned unchanged,
    /// whatever its status: the identity of the request decides, not the
    /// payload. Otherwise the room must exist and be available, and no
    /// active lock may overlap the interval.
    #[tracing::instrument(skip(self), fields(request_id = %request_id, room_id = %room_id))]
    pub async fn hold(
        &self,
        request_id: RequestId,
        room_id: RoomId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        correlation_id: Option<CorrelationId>,
    ) -> Result<RoomLock> {
        let now = Utc::now();
        validate_stay(start_date, end_date, now.date_naive())?;

        if let Some(existing) = self.store.find_lock(&request_id).await? {
            tracing::info!(status = %existing.status, "hold replay, returning existing lock");
            return Ok(existing);
        }

        let room = self
            .store
            .get_room(room_id)
            .await?
            .ok_or(HotelError::RoomNotFound(room_id))?;
        if !room.is_bookable() {
            return Err(HotelError::RoomUnavailable(room_id));
        }

        let lock = RoomLock::hold(
            request_id.clone(),
            room_id,
            start_date,
            end_date,
            self.hold_ttl,
            correlation_id,
            now,
        );

        match self.store.insert_lock_if_vacant(lock).await {
            Ok(lock) => {
                metrics::counter!("holds_created").increment(1);
                tracing::info!(lock_id = %lock.id, expires_at = %lock.expires_at, "hold placed");
                Ok(lock)
            }
            Err(HotelError::DuplicateRequest(_)) => {
                // A concurrent duplicate inserted first; its row is the
                // canonical outcome for this request id.
                self.store
                    .find_lock(&request_id)
                    .await?
                    .ok_or(HotelError::LockNotFound(request_id))
            }
            Err(HotelError::DateConflict(room_id)) => {
                metrics::counter!("lock_conflicts_total").increment(1);
                tracing::warn!(%room_id, %start_date, %end_date, "hold conflict");
                Err(HotelError::DateConflict(room_id))
            }
            Err(e) => Err(e),
        }
    }

    /// Promotes a held lock to `Confirmed` and bumps the room's
    /// `times_booked` counter.
    ///
    /// Confirming an already-confirmed lock is a no-op returning the row;
    /// released and expired locks refuse with their respective errors.
    #[tracing::instrument(skip(self), fields(request_id = %request_id))]
    pub async fn confirm(&self, request_id: &RequestId) -> Result<RoomLock> {
        loop {
            let lock = self
                .store
                .find_lock(request_id)
                .await?
                .ok_or_else(|| HotelError::LockNotFound(request_id.clone()))?;
            let now = Utc::now();

            match lock.status {
                LockStatus::Confirmed => return Ok(lock),
                LockStatus::Released => {
                    return Err(HotelError::AlreadyReleased(request_id.clone()));
                }
                LockStatus::Expired => return Err(HotelError::HoldExpired(request_id.clone())),
                LockStatus::Held if lock.is_past_deadline(now) => {
                    return Err(HotelError::HoldExpired(request_id.clone()));
                }
                LockStatus::Held => {
                    if let Some(confirmed) = self.store.confirm_lock(request_id, now).await? {
                        self.store.increment_times_booked(confirmed.room_id).await?;
                        metrics::counter!("locks_confirmed").increment(1);
                        tracing::info!(lock_id = %confirmed.id, room_id = %confirmed.room_id, "hold confirmed");
                        return Ok(confirmed);
                    }
                    // Lost the race against a concurrent transition or the
                    // sweeper; re-read and classify again.
                }
            }
        }
    }

    /// Releases a held lock, freeing its interval.
    ///
    /// Releasing an already-released lock is a no-op returning the row. A
    /// confirmed lock is returned unchanged: late compensation must not
    /// silently undo a committed booking. An expired lock refuses, since it
    /// is already in a final status.
    #[tracing::instrument(skip(self), fields(request_id = %request_id))]
    pub async fn release(&self, request_id: &RequestId) -> Result<RoomLock> {
        loop {
            let lock = self
                .store
                .find_lock(request_id)
                .await?
                .ok_or_else(|| HotelError::LockNotFound(request_id.clone()))?;
            let now = Utc::now();

            match lock.status {
                LockStatus::Released | LockStatus::Confirmed => return Ok(lock),
                LockStatus::Expired => {
                    return Err(HotelError::InvalidTransition {
                        request_id: request_id.clone(),
                        status: lock.status,
                        operation: "release",
                    });
                }
                LockStatus::Held => {
                    if let Some(released) = self.store.release_lock(request_id, now).await? {
                        metrics::counter!("locks_released").increment(1);
                        tracing::info!(lock_id = %released.id, room_id = %released.room_id, "hold released");
                        return Ok(released);
                    }
                }
            }
        }
    }
}

/// Validates the stay interval at the operation boundary.
///
/// Rejects empty or inverted intervals and stays starting before `today`.
pub fn validate_stay(
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> Result<()> {
    if start_date >= end_date {
        return Err(HotelError::InvalidDates(format!(
            "start date {start_date} must be before end date {end_date}"
        )));
    }
    if start_date < today {
        return Err(HotelError::InvalidDates(format!(
            "start date {start_date} is in the past"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryHotelStore;
    use crate::room::Room;

    async fn setup() -> (LockEngine<InMemoryHotelStore>, Room) {
        let store = InMemoryHotelStore::new();
        let room = Room::new("713", 2);
        store.insert_room(room.clone()).await.unwrap();
        (LockEngine::with_default_ttl(store), room)
    }

    fn stay(offset_days: i64, nights: i64) -> (NaiveDate, NaiveDate) {
        let start = Utc::now().date_naive() + Duration::days(offset_days);
        (start, start + Duration::days(nights))
    }

    #[tokio::test]
    async fn hold_creates_a_held_lock() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);

        let lock = engine
            .hold(RequestId::generate(), room.id, start, end, None)
            .await
            .unwrap();

        assert_eq!(lock.status, LockStatus::Held);
        assert_eq!(lock.room_id, room.id);
        assert_eq!((lock.start_date, lock.end_date), (start, end));
    }

    #[tokio::test]
    async fn hold_is_idempotent_by_request_id() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);
        let request_id = RequestId::generate();

        let first = engine
            .hold(request_id.clone(), room.id, start, end, None)
            .await
            .unwrap();
        // second call with different dates still returns the original row:
        // the identity of the request decides, not the payload
        let (other_start, other_end) = stay(10, 2);
        let second = engine
            .hold(request_id, room.id, other_start, other_end, None)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.start_date, start);
        assert_eq!(engine.store().lock_count().await, 1);
    }

    #[tokio::test]
    async fn overlapping_holds_conflict() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);

        engine
            .hold(RequestId::generate(), room.id, start, end, None)
            .await
            .unwrap();

        let err = engine
            .hold(
                RequestId::generate(),
                room.id,
                start + Duration::days(1),
                end + Duration::days(1),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HotelError::DateConflict(id) if id == room.id));
    }

    #[tokio::test]
    async fn adjacent_holds_both_succeed() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);

        engine
            .hold(RequestId::generate(), room.id, start, end, None)
            .await
            .unwrap();
        engine
            .hold(RequestId::generate(), room.id, end, end + Duration::days(2), None)
            .await
            .unwrap();

        assert_eq!(engine.store().lock_count().await, 2);
    }

    #[tokio::test]
    async fn hold_rejects_unknown_room() {
        let (engine, _) = setup().await;
        let (start, end) = stay(1, 2);

        let err = engine
            .hold(RequestId::generate(), RoomId::new(), start, end, None)
            .await
            .unwrap_err();
        assert!(matches!(err, HotelError::RoomNotFound(_)));
    }

    #[tokio::test]
    async fn hold_rejects_unavailable_room() {
        let (engine, _) = setup().await;
        let mut room = Room::new("714", 2);
        room.available = false;
        engine.store().insert_room(room.clone()).await.unwrap();
        let (start, end) = stay(1, 2);

        let err = engine
            .hold(RequestId::generate(), room.id, start, end, None)
            .await
            .unwrap_err();
        assert!(matches!(err, HotelError::RoomUnavailable(id) if id == room.id));
    }

    #[tokio::test]
    async fn hold_rejects_bad_dates() {
        let (engine, room) = setup().await;
        let today = Utc::now().date_naive();

        // inverted
        let err = engine
            .hold(
                RequestId::generate(),
                room.id,
                today + Duration::days(3),
                today + Duration::days(1),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HotelError::InvalidDates(_)));

        // empty
        let err = engine
            .hold(
                RequestId::generate(),
                room.id,
                today + Duration::days(1),
                today + Duration::days(1),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HotelError::InvalidDates(_)));

        // in the past
        let err = engine
            .hold(
                RequestId::generate(),
                room.id,
                today - Duration::days(1),
                today + Duration::days(1),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HotelError::InvalidDates(_)));
    }

    #[tokio::test]
    async fn confirm_promotes_and_bumps_counter() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);
        let request_id = RequestId::generate();

        engine
            .hold(request_id.clone(), room.id, start, end, None)
            .await
            .unwrap();
        let confirmed = engine.confirm(&request_id).await.unwrap();

        assert_eq!(confirmed.status, LockStatus::Confirmed);
        let room = engine.store().get_room(room.id).await.unwrap().unwrap();
        assert_eq!(room.times_booked, 1);
    }

    #[tokio::test]
    async fn confirm_is_idempotent_and_bumps_counter_once() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);
        let request_id = RequestId::generate();

        engine
            .hold(request_id.clone(), room.id, start, end, None)
            .await
            .unwrap();
        let first = engine.confirm(&request_id).await.unwrap();
        let second = engine.confirm(&request_id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, LockStatus::Confirmed);
        let room = engine.store().get_room(room.id).await.unwrap().unwrap();
        assert_eq!(room.times_booked, 1);
    }

    #[tokio::test]
    async fn confirm_unknown_request_fails() {
        let (engine, _) = setup().await;
        let err = engine.confirm(&RequestId::generate()).await.unwrap_err();
        assert!(matches!(err, HotelError::LockNotFound(_)));
    }

    #[tokio::test]
    async fn confirm_after_release_fails() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);
        let request_id = RequestId::generate();

        engine
            .hold(request_id.clone(), room.id, start, end, None)
            .await
            .unwrap();
        engine.release(&request_id).await.unwrap();

        let err = engine.confirm(&request_id).await.unwrap_err();
        assert!(matches!(err, HotelError::AlreadyReleased(_)));
    }

    #[tokio::test]
    async fn confirm_of_stale_hold_fails_even_before_sweep() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);
        let request_id = RequestId::generate();

        // insert a hold whose deadline has already passed
        let mut lock = RoomLock::hold(
            request_id.clone(),
            room.id,
            start,
            end,
            Duration::minutes(15),
            None,
            Utc::now(),
        );
        lock.expires_at = Utc::now() - Duration::minutes(1);
        engine.store().insert_lock_if_vacant(lock).await.unwrap();

        let err = engine.confirm(&request_id).await.unwrap_err();
        assert!(matches!(err, HotelError::HoldExpired(_)));

        let room = engine.store().get_room(room.id).await.unwrap().unwrap();
        assert_eq!(room.times_booked, 0);
    }

    #[tokio::test]
    async fn release_frees_the_interval() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);
        let request_id = RequestId::generate();

        engine
            .hold(request_id.clone(), room.id, start, end, None)
            .await
            .unwrap();
        let released = engine.release(&request_id).await.unwrap();
        assert_eq!(released.status, LockStatus::Released);

        // the interval is available again
        engine
            .hold(RequestId::generate(), room.id, start, end, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);
        let request_id = RequestId::generate();

        engine
            .hold(request_id.clone(), room.id, start, end, None)
            .await
            .unwrap();
        let first = engine.release(&request_id).await.unwrap();
        let second = engine.release(&request_id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.status, LockStatus::Released);
    }

    #[tokio::test]
    async fn release_keeps_confirmed_lock_confirmed() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);
        let request_id = RequestId::generate();

        engine
            .hold(request_id.clone(), room.id, start, end, None)
            .await
            .unwrap();
        engine.confirm(&request_id).await.unwrap();

        let after_release = engine.release(&request_id).await.unwrap();
        assert_eq!(after_release.status, LockStatus::Confirmed);
    }

    #[tokio::test]
    async fn release_of_expired_lock_fails() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);
        let request_id = RequestId::generate();

        let mut lock = RoomLock::hold(
            request_id.clone(),
            room.id,
            start,
            end,
            Duration::minutes(15),
            None,
            Utc::now(),
        );
        lock.status = LockStatus::Expired;
        engine.store().insert_lock_if_vacant(lock).await.unwrap();

        let err = engine.release(&request_id).await.unwrap_err();
        assert!(matches!(
            err,
            HotelError::InvalidTransition {
                status: LockStatus::Expired,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn release_unknown_request_fails() {
        let (engine, _) = setup().await;
        let err = engine.release(&RequestId::generate()).await.unwrap_err();
        assert!(matches!(err, HotelError::LockNotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_overlapping_holds_admit_exactly_one() {
        let (engine, room) = setup().await;
        let (start, end) = stay(1, 2);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .hold(RequestId::generate(), room.id, start, end, None)
                    .await
            }));
        }

        let mut successes = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(HotelError::DateConflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 7);

        // interval safety: at most one blocking lock on the room
        let blocking = engine
            .store()
            .locks_for_room(room.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|l| l.status.blocks_interval())
            .count();
        assert_eq!(blocking, 1);
    }
}
