use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CorrelationId, RequestId, ReservationId, RoomId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::reservation::{Reservation, ReservationStatus};
use crate::store::ReservationStore;
use crate::{BookingError, Result};

const RESERVATION_COLUMNS: &str = "id, request_id, user_id, room_id, start_date, end_date, \
     status, correlation_id, created_at, updated_at";

/// PostgreSQL-backed reservation store.
#[derive(Clone)]
pub struct PostgresReservationStore {
    pool: PgPool,
}

impl PostgresReservationStore {
    /// Creates a new PostgreSQL reservation store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations for the booking service.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations/booking")
            .run(&self.pool)
            .await
    }

    fn row_to_reservation(row: PgRow) -> Result<Reservation> {
        let status: String = row.try_get("status")?;
        let status: ReservationStatus = status.parse().map_err(BookingError::InvalidStatus)?;
        let request_id: String = row.try_get("request_id")?;
        let request_id = RequestId::parse(&request_id)
            .ok_or_else(|| BookingError::InvalidStatus("blank request_id".to_string()))?;
        let correlation_id: String = row.try_get("correlation_id")?;
        let correlation_id = CorrelationId::from_header(&correlation_id)
            .ok_or_else(|| BookingError::InvalidStatus("blank correlation_id".to_string()))?;

        Ok(Reservation {
            id: ReservationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            request_id,
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            room_id: RoomId::from_uuid(row.try_get::<Uuid, _>("room_id")?),
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            status,
            correlation_id,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    async fn find_by_request_id(&self, request_id: &RequestId) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE request_id = $1"
        ))
        .bind(request_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_reservation).transpose()
    }

    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_reservation).transpose()
    }

    async fn insert_pending(&self, reservation: Reservation) -> Result<Reservation> {
        sqlx::query(
            r#"
            INSERT INTO reservations
                (id, request_id, user_id, room_id, start_date, end_date,
                 status, correlation_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(reservation.id.as_uuid())
        .bind(reservation.request_id.as_str())
        .bind(reservation.user_id.as_uuid())
        .bind(reservation.room_id.as_uuid())
        .bind(reservation.start_date)
        .bind(reservation.end_date)
        .bind(reservation.status.as_str())
        .bind(reservation.correlation_id.as_str())
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("uk_reservation_request")
            {
                return BookingError::DuplicateRequest(reservation.request_id.clone());
            }
            BookingError::Database(e)
        })?;

        Ok(reservation)
    }

    async fn complete(
        &self,
        id: ReservationId,
        status: ReservationStatus,
        now: DateTime<Utc>,
    ) -> Result<Reservation> {
        let updated = sqlx::query(&format!(
            "UPDATE reservations SET status = $2, updated_at = $3 \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING {RESERVATION_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => Self::row_to_reservation(row),
            // already terminal; return the canonical row
            None => self
                .find_by_id(id)
                .await?
                .ok_or(BookingError::NotFound(id)),
        }
    }
}
