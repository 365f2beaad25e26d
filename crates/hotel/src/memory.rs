use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{RequestId, RoomId};
use tokio::sync::RwLock;

use crate::lock::{LockStatus, RoomLock, intervals_overlap};
use crate::room::Room;
use crate::store::HotelStore;
use crate::{HotelError, Result};

#[derive(Default)]
struct Inner {
    rooms: HashMap<RoomId, Room>,
    locks: HashMap<RequestId, RoomLock>,
}

/// In-memory hotel store for testing and single-node runs.
///
/// Provides the same interface as the PostgreSQL implementation. The write
/// lock over the whole state serializes the conflict-probe-then-insert
/// critical section, which is the in-memory counterpart of the advisory
/// lock the Postgres store takes per room.
#[derive(Clone, Default)]
pub struct InMemoryHotelStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryHotelStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of lock rows.
    pub async fn lock_count(&self) -> usize {
        self.inner.read().await.locks.len()
    }
}

#[async_trait]
impl HotelStore for InMemoryHotelStore {
    async fn insert_room(&self, room: Room) -> Result<Room> {
        let mut inner = self.inner.write().await;
        inner.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn get_room(&self, room_id: RoomId) -> Result<Option<Room>> {
        Ok(self.inner.read().await.rooms.get(&room_id).cloned())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>> {
        let inner = self.inner.read().await;
        let mut rooms: Vec<Room> = inner.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.id.as_uuid().cmp(&b.id.as_uuid()));
        Ok(rooms)
    }

    async fn increment_times_booked(&self, room_id: RoomId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let room = inner
            .rooms
            .get_mut(&room_id)
            .ok_or(HotelError::RoomNotFound(room_id))?;
        room.times_booked += 1;
        room.updated_at = Utc::now();
        Ok(())
    }

    async fn find_lock(&self, request_id: &RequestId) -> Result<Option<RoomLock>> {
        Ok(self.inner.read().await.locks.get(request_id).cloned())
    }

    async fn insert_lock_if_vacant(&self, lock: RoomLock) -> Result<RoomLock> {
        let mut inner = self.inner.write().await;

        if inner.locks.contains_key(&lock.request_id) {
            return Err(HotelError::DuplicateRequest(lock.request_id));
        }

        let conflict = inner.locks.values().any(|existing| {
            existing.room_id == lock.room_id
                && existing.status.blocks_interval()
                && intervals_overlap(
                    existing.start_date,
                    existing.end_date,
                    lock.start_date,
                    lock.end_date,
                )
        });
        if conflict {
            return Err(HotelError::DateConflict(lock.room_id));
        }

        inner.locks.insert(lock.request_id.clone(), lock.clone());
        Ok(lock)
    }

    async fn confirm_lock(
        &self,
        request_id: &RequestId,
        now: DateTime<Utc>,
    ) -> Result<Option<RoomLock>> {
        let mut inner = self.inner.write().await;
        let Some(lock) = inner.locks.get_mut(request_id) else {
            return Ok(None);
        };
        if lock.status != LockStatus::Held || lock.expires_at < now {
            return Ok(None);
        }
        lock.status = LockStatus::Confirmed;
        lock.updated_at = now;
        Ok(Some(lock.clone()))
    }

    async fn release_lock(
        &self,
        request_id: &RequestId,
        now: DateTime<Utc>,
    ) -> Result<Option<RoomLock>> {
        let mut inner = self.inner.write().await;
        let Some(lock) = inner.locks.get_mut(request_id) else {
            return Ok(None);
        };
        if lock.status != LockStatus::Held {
            return Ok(None);
        }
        lock.status = LockStatus::Released;
        lock.updated_at = now;
        Ok(Some(lock.clone()))
    }

    async fn expire_due_locks(&self, now: DateTime<Utc>) -> Result<Vec<RoomLock>> {
        let mut inner = self.inner.write().await;
        let mut expired = Vec::new();
        for lock in inner.locks.values_mut() {
            if lock.status == LockStatus::Held && lock.expires_at < now {
                lock.status = LockStatus::Expired;
                lock.updated_at = now;
                expired.push(lock.clone());
            }
        }
        Ok(expired)
    }

    async fn purge_terminal_locks_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.locks.len();
        inner.locks.retain(|_, lock| {
            !(matches!(lock.status, LockStatus::Released | LockStatus::Expired)
                && lock.updated_at < cutoff)
        });
        Ok((before - inner.locks.len()) as u64)
    }

    async fn locks_for_room(&self, room_id: RoomId) -> Result<Vec<RoomLock>> {
        let inner = self.inner.read().await;
        let mut locks: Vec<RoomLock> = inner
            .locks
            .values()
            .filter(|l| l.room_id == room_id)
            .cloned()
            .collect();
        locks.sort_by_key(|l| l.created_at);
        Ok(locks)
    }

    async fn count_locks_by_status(&self) -> Result<Vec<(LockStatus, u64)>> {
        let inner = self.inner.read().await;
        let mut counts: HashMap<LockStatus, u64> = HashMap::new();
        for lock in inner.locks.values() {
            *counts.entry(lock.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}
