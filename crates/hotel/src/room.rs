//! Room inventory record.

use chrono::{DateTime, Utc};
use common::RoomId;
use serde::{Deserialize, Serialize};

/// A bookable room.
///
/// The lock engine only needs the room's identity, its availability flag,
/// and the `times_booked` statistic; everything else about rooms (pricing,
/// amenities, the owning hotel) lives outside this service's core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub number: String,
    pub capacity: i32,
    /// At-least-once booking counter, bumped on every confirmed lock.
    pub times_booked: i64,
    /// When false, new holds are rejected; existing locks are unaffected.
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Creates a new available room.
    pub fn new(number: impl Into<String>, capacity: i32) -> Self {
        let now = Utc::now();
        Self {
            id: RoomId::new(),
            number: number.into(),
            capacity,
            times_booked: 0,
            available: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if new holds may be placed on this room.
    pub fn is_bookable(&self) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_room_is_bookable() {
        let room = Room::new("101", 2);
        assert!(room.is_bookable());
        assert_eq!(room.times_booked, 0);
        assert_eq!(room.number, "101");
    }

    #[test]
    fn unavailable_room_is_not_bookable() {
        let mut room = Room::new("102", 2);
        room.available = false;
        assert!(!room.is_bookable());
    }
}
