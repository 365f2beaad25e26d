//! Room lock record and its status state machine.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::{CorrelationId, LockId, RequestId, RoomId};
use serde::{Deserialize, Serialize};

/// The status of a room lock.
///
/// Transitions:
/// ```text
/// Held ──┬──► Confirmed        (saga forward success)
///        ├──► Released         (saga compensation)
///        └──► Expired          (sweeper, after the hold TTL)
/// ```
/// `Confirmed`, `Released`, and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockStatus {
    /// The interval is blocked pending confirmation; subject to expiry.
    Held,
    /// The booking is committed; the interval stays blocked.
    Confirmed,
    /// The hold was abandoned by compensation; the interval is free.
    Released,
    /// The hold timed out; the interval is free.
    Expired,
}

impl LockStatus {
    /// Returns true if a lock in this status blocks its date interval.
    ///
    /// Only `Held` and `Confirmed` locks participate in conflict detection.
    pub fn blocks_interval(&self) -> bool {
        matches!(self, LockStatus::Held | LockStatus::Confirmed)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LockStatus::Held)
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            LockStatus::Held => "HELD",
            LockStatus::Confirmed => "CONFIRMED",
            LockStatus::Released => "RELEASED",
            LockStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for LockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HELD" => Ok(LockStatus::Held),
            "CONFIRMED" => Ok(LockStatus::Confirmed),
            "RELEASED" => Ok(LockStatus::Released),
            "EXPIRED" => Ok(LockStatus::Expired),
            other => Err(other.to_string()),
        }
    }
}

/// Returns true if the half-open intervals `[a_start, a_end)` and
/// `[b_start, b_end)` overlap.
///
/// Strict comparison on both sides: intervals that touch at a boundary
/// (`a_end == b_start`) do not conflict.
pub fn intervals_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// A time-bounded lock on a room's date interval.
///
/// Created by `hold`, uniquely keyed by `request_id`, and transitioned only
/// through the lock engine. Never mutated in place outside the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLock {
    pub id: LockId,
    pub request_id: RequestId,
    pub room_id: RoomId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LockStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Wall-clock deadline; only meaningful while the lock is `Held`.
    pub expires_at: DateTime<Utc>,
    pub correlation_id: Option<CorrelationId>,
}

impl RoomLock {
    /// Creates a fresh hold expiring `ttl` from `now`.
    #[allow(clippy::too_many_arguments)]
    pub fn hold(
        request_id: RequestId,
        room_id: RoomId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        ttl: Duration,
        correlation_id: Option<CorrelationId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LockId::new(),
            request_id,
            room_id,
            start_date,
            end_date,
            status: LockStatus::Held,
            created_at: now,
            updated_at: now,
            expires_at: now + ttl,
            correlation_id,
        }
    }

    /// Returns true if this hold's deadline has passed.
    ///
    /// Only meaningful for `Held` locks; the sweeper turns such locks into
    /// `Expired` rows, but a confirm racing ahead of the sweeper must treat
    /// a stale `Held` lock as expired too.
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Returns true if this lock blocks the given half-open interval.
    pub fn blocks(&self, start_date: NaiveDate, end_date: NaiveDate) -> bool {
        self.status.blocks_interval()
            && intervals_overlap(self.start_date, self.end_date, start_date, end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn held_and_confirmed_block_their_interval() {
        assert!(LockStatus::Held.blocks_interval());
        assert!(LockStatus::Confirmed.blocks_interval());
        assert!(!LockStatus::Released.blocks_interval());
        assert!(!LockStatus::Expired.blocks_interval());
    }

    #[test]
    fn only_held_is_non_terminal() {
        assert!(!LockStatus::Held.is_terminal());
        assert!(LockStatus::Confirmed.is_terminal());
        assert!(LockStatus::Released.is_terminal());
        assert!(LockStatus::Expired.is_terminal());
    }

    #[test]
    fn status_roundtrips_through_storage_form() {
        for status in [
            LockStatus::Held,
            LockStatus::Confirmed,
            LockStatus::Released,
            LockStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<LockStatus>().unwrap(), status);
        }
        assert!("HOLDING".parse::<LockStatus>().is_err());
    }

    #[test]
    fn overlapping_intervals_conflict() {
        assert!(intervals_overlap(
            date("2026-09-01"),
            date("2026-09-03"),
            date("2026-09-02"),
            date("2026-09-04"),
        ));
        // containment
        assert!(intervals_overlap(
            date("2026-09-01"),
            date("2026-09-10"),
            date("2026-09-03"),
            date("2026-09-04"),
        ));
        // identical
        assert!(intervals_overlap(
            date("2026-09-01"),
            date("2026-09-03"),
            date("2026-09-01"),
            date("2026-09-03"),
        ));
    }

    #[test]
    fn touching_intervals_do_not_conflict() {
        assert!(!intervals_overlap(
            date("2026-09-01"),
            date("2026-09-03"),
            date("2026-09-03"),
            date("2026-09-05"),
        ));
        assert!(!intervals_overlap(
            date("2026-09-03"),
            date("2026-09-05"),
            date("2026-09-01"),
            date("2026-09-03"),
        ));
    }

    #[test]
    fn disjoint_intervals_do_not_conflict() {
        assert!(!intervals_overlap(
            date("2026-09-01"),
            date("2026-09-02"),
            date("2026-09-05"),
            date("2026-09-06"),
        ));
    }

    #[test]
    fn hold_sets_deadline_from_ttl() {
        let now = Utc::now();
        let lock = RoomLock::hold(
            RequestId::generate(),
            RoomId::new(),
            date("2026-09-01"),
            date("2026-09-03"),
            Duration::minutes(15),
            None,
            now,
        );
        assert_eq!(lock.status, LockStatus::Held);
        assert_eq!(lock.expires_at, now + Duration::minutes(15));
        assert!(!lock.is_past_deadline(now));
        assert!(lock.is_past_deadline(now + Duration::minutes(16)));
    }

    #[test]
    fn released_lock_does_not_block() {
        let now = Utc::now();
        let mut lock = RoomLock::hold(
            RequestId::generate(),
            RoomId::new(),
            date("2026-09-01"),
            date("2026-09-03"),
            Duration::minutes(15),
            None,
            now,
        );
        assert!(lock.blocks(date("2026-09-02"), date("2026-09-04")));
        lock.status = LockStatus::Released;
        assert!(!lock.blocks(date("2026-09-02"), date("2026-09-04")));
    }
}
