//! Reservation record and its status state machine.

use chrono::{DateTime, NaiveDate, Utc};
use common::{CorrelationId, RequestId, ReservationId, RoomId, UserId};
use serde::{Deserialize, Serialize};

/// The status of a reservation.
///
/// Transitions:
/// ```text
/// Pending ──┬──► Confirmed     (saga forward success)
///           └──► Cancelled     (saga failure, after compensation)
/// ```
/// `Confirmed` and `Cancelled` are terminal; the saga never returns a
/// `Pending` reservation to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Pending)
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReservationStatus::Pending),
            "CONFIRMED" => Ok(ReservationStatus::Confirmed),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            other => Err(other.to_string()),
        }
    }
}

/// A room reservation, owned and mutated only by the saga.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub request_id: RequestId,
    pub user_id: UserId,
    pub room_id: RoomId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ReservationStatus,
    pub correlation_id: CorrelationId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Creates a new `Pending` reservation. Persisting it is the saga's
    /// commit-point marker: after that write, the saga must drive the row
    /// to a terminal status.
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        request_id: RequestId,
        user_id: UserId,
        room_id: RoomId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        correlation_id: CorrelationId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReservationId::new(),
            request_id,
            user_id,
            room_id,
            start_date,
            end_date,
            status: ReservationStatus::Pending,
            correlation_id,
            created_at: now,
            updated_at: now,
        }
    }
}
