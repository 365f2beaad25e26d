use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CorrelationId, LockId, RequestId, RoomId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::lock::{LockStatus, RoomLock};
use crate::room::Room;
use crate::store::HotelStore;
use crate::{HotelError, Result};

const LOCK_COLUMNS: &str = "id, request_id, room_id, start_date, end_date, status, \
     created_at, updated_at, expires_at, correlation_id";

/// PostgreSQL-backed hotel store.
///
/// The hold path serializes the conflict probe and the insert per room with
/// `pg_advisory_xact_lock`, held for the duration of the insert transaction.
/// Status transitions are single conditional `UPDATE ... RETURNING`
/// statements, so they are atomic without explicit row locking.
#[derive(Clone)]
pub struct PostgresHotelStore {
    pool: PgPool,
}

impl PostgresHotelStore {
    /// Creates a new PostgreSQL hotel store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations for the hotel service.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations/hotel").run(&self.pool).await
    }

    fn row_to_lock(row: PgRow) -> Result<RoomLock> {
        let status: String = row.try_get("status")?;
        let status: LockStatus = status.parse().map_err(HotelError::InvalidStatus)?;
        let request_id: String = row.try_get("request_id")?;
        let request_id = RequestId::parse(&request_id)
            .ok_or_else(|| HotelError::InvalidStatus("blank request_id".to_string()))?;
        let correlation_id: Option<String> = row.try_get("correlation_id")?;

        Ok(RoomLock {
            id: LockId::from_uuid(row.try_get::<Uuid, _>("id")?),
            request_id,
            room_id: RoomId::from_uuid(row.try_get::<Uuid, _>("room_id")?),
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            expires_at: row.try_get("expires_at")?,
            correlation_id: correlation_id.as_deref().and_then(CorrelationId::from_header),
        })
    }

    fn row_to_room(row: PgRow) -> Result<Room> {
        Ok(Room {
            id: RoomId::from_uuid(row.try_get::<Uuid, _>("id")?),
            number: row.try_get("number")?,
            capacity: row.try_get("capacity")?,
            times_booked: row.try_get("times_booked")?,
            available: row.try_get("available")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl HotelStore for PostgresHotelStore {
    async fn insert_room(&self, room: Room) -> Result<Room> {
        sqlx::query(
            r#"
            INSERT INTO rooms (id, number, capacity, times_booked, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(room.id.as_uuid())
        .bind(&room.number)
        .bind(room.capacity)
        .bind(room.times_booked)
        .bind(room.available)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(room)
    }

    async fn get_room(&self, room_id: RoomId) -> Result<Option<Room>> {
        let row = sqlx::query(
            "SELECT id, number, capacity, times_booked, available, created_at, updated_at \
             FROM rooms WHERE id = $1",
        )
        .bind(room_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_room).transpose()
    }

    async fn list_rooms(&self) -> Result<Vec<Room>> {
        let rows = sqlx::query(
            "SELECT id, number, capacity, times_booked, available, created_at, updated_at \
             FROM rooms ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_room).collect()
    }

    async fn increment_times_booked(&self, room_id: RoomId) -> Result<()> {
        let result = sqlx::query(
            "UPDATE rooms SET times_booked = times_booked + 1, updated_at = $2 WHERE id = $1",
        )
        .bind(room_id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(HotelError::RoomNotFound(room_id));
        }
        Ok(())
    }

    async fn find_lock(&self, request_id: &RequestId) -> Result<Option<RoomLock>> {
        let row = sqlx::query(&format!(
            "SELECT {LOCK_COLUMNS} FROM room_locks WHERE request_id = $1"
        ))
        .bind(request_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_lock).transpose()
    }

    async fn insert_lock_if_vacant(&self, lock: RoomLock) -> Result<RoomLock> {
        let mut tx = self.pool.begin().await?;

        // Serialize the probe-then-insert critical section per room. The
        // advisory lock is released automatically at commit/rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(lock.room_id.as_uuid().to_string())
            .execute(&mut *tx)
            .await?;

        let conflict: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM room_locks
                WHERE room_id = $1
                  AND status IN ('HELD', 'CONFIRMED')
                  AND start_date < $3
                  AND $2 < end_date
            )
            "#,
        )
        .bind(lock.room_id.as_uuid())
        .bind(lock.start_date)
        .bind(lock.end_date)
        .fetch_one(&mut *tx)
        .await?;

        if conflict {
            return Err(HotelError::DateConflict(lock.room_id));
        }

        sqlx::query(
            r#"
            INSERT INTO room_locks
                (id, request_id, room_id, start_date, end_date, status,
                 created_at, updated_at, expires_at, correlation_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(lock.id.as_uuid())
        .bind(lock.request_id.as_str())
        .bind(lock.room_id.as_uuid())
        .bind(lock.start_date)
        .bind(lock.end_date)
        .bind(lock.status.as_str())
        .bind(lock.created_at)
        .bind(lock.updated_at)
        .bind(lock.expires_at)
        .bind(lock.correlation_id.as_ref().map(|c| c.as_str()))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("uk_lock_request")
            {
                return HotelError::DuplicateRequest(lock.request_id.clone());
            }
            HotelError::Database(e)
        })?;

        tx.commit().await?;
        Ok(lock)
    }

    async fn confirm_lock(
        &self,
        request_id: &RequestId,
        now: DateTime<Utc>,
    ) -> Result<Option<RoomLock>> {
        let row = sqlx::query(&format!(
            "UPDATE room_locks SET status = 'CONFIRMED', updated_at = $2 \
             WHERE request_id = $1 AND status = 'HELD' AND expires_at >= $2 \
             RETURNING {LOCK_COLUMNS}"
        ))
        .bind(request_id.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_lock).transpose()
    }

    async fn release_lock(
        &self,
        request_id: &RequestId,
        now: DateTime<Utc>,
    ) -> Result<Option<RoomLock>> {
        let row = sqlx::query(&format!(
            "UPDATE room_locks SET status = 'RELEASED', updated_at = $2 \
             WHERE request_id = $1 AND status = 'HELD' \
             RETURNING {LOCK_COLUMNS}"
        ))
        .bind(request_id.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_lock).transpose()
    }

    async fn expire_due_locks(&self, now: DateTime<Utc>) -> Result<Vec<RoomLock>> {
        let rows = sqlx::query(&format!(
            "UPDATE room_locks SET status = 'EXPIRED', updated_at = $1 \
             WHERE status = 'HELD' AND expires_at < $1 \
             RETURNING {LOCK_COLUMNS}"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_lock).collect()
    }

    async fn purge_terminal_locks_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM room_locks \
             WHERE status IN ('RELEASED', 'EXPIRED') AND updated_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn locks_for_room(&self, room_id: RoomId) -> Result<Vec<RoomLock>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOCK_COLUMNS} FROM room_locks WHERE room_id = $1 ORDER BY created_at"
        ))
        .bind(room_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_lock).collect()
    }

    async fn count_locks_by_status(&self) -> Result<Vec<(LockStatus, u64)>> {
        let rows =
            sqlx::query("SELECT status, COUNT(*) AS count FROM room_locks GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                let status: LockStatus = status.parse().map_err(HotelError::InvalidStatus)?;
                let count: i64 = row.try_get("count")?;
                Ok((status, count as u64))
            })
            .collect()
    }
}
