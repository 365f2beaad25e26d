use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{RequestId, ReservationId};
use tokio::sync::RwLock;

use crate::reservation::{Reservation, ReservationStatus};
use crate::store::ReservationStore;
use crate::{BookingError, Result};

/// In-memory reservation store for testing and single-node runs.
///
/// Provides the same interface as the PostgreSQL implementation; the write
/// lock stands in for the unique index on `request_id`.
#[derive(Clone, Default)]
pub struct InMemoryReservationStore {
    inner: Arc<RwLock<HashMap<ReservationId, Reservation>>>,
}

impl InMemoryReservationStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of reservation rows.
    pub async fn reservation_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn find_by_request_id(&self, request_id: &RequestId) -> Result<Option<Reservation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .values()
            .find(|r| &r.request_id == request_id)
            .cloned())
    }

    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn insert_pending(&self, reservation: Reservation) -> Result<Reservation> {
        let mut inner = self.inner.write().await;
        if inner
            .values()
            .any(|r| r.request_id == reservation.request_id)
        {
            return Err(BookingError::DuplicateRequest(reservation.request_id));
        }
        inner.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn complete(
        &self,
        id: ReservationId,
        status: ReservationStatus,
        now: DateTime<Utc>,
    ) -> Result<Reservation> {
        let mut inner = self.inner.write().await;
        let reservation = inner.get_mut(&id).ok_or(BookingError::NotFound(id))?;
        if reservation.status == ReservationStatus::Pending {
            reservation.status = status;
            reservation.updated_at = now;
        }
        Ok(reservation.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CorrelationId, RoomId, UserId};

    fn pending() -> Reservation {
        Reservation::pending(
            RequestId::generate(),
            UserId::new(),
            RoomId::new(),
            "2026-09-01".parse().unwrap(),
            "2026-09-03".parse().unwrap(),
            CorrelationId::generate("booking"),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn insert_and_find() {
        let store = InMemoryReservationStore::new();
        let reservation = pending();

        store.insert_pending(reservation.clone()).await.unwrap();

        let by_request = store
            .find_by_request_id(&reservation.request_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_request.id, reservation.id);

        let by_id = store.find_by_id(reservation.id).await.unwrap().unwrap();
        assert_eq!(by_id.request_id, reservation.request_id);
    }

    #[tokio::test]
    async fn duplicate_request_id_is_rejected() {
        let store = InMemoryReservationStore::new();
        let reservation = pending();
        store.insert_pending(reservation.clone()).await.unwrap();

        let mut dup = pending();
        dup.request_id = reservation.request_id.clone();
        let err = store.insert_pending(dup).await.unwrap_err();
        assert!(matches!(err, BookingError::DuplicateRequest(_)));
        assert_eq!(store.reservation_count().await, 1);
    }

    #[tokio::test]
    async fn complete_writes_terminal_status_once() {
        let store = InMemoryReservationStore::new();
        let reservation = pending();
        store.insert_pending(reservation.clone()).await.unwrap();

        let confirmed = store
            .complete(reservation.id, ReservationStatus::Confirmed, Utc::now())
            .await
            .unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);

        // terminal statuses never transition further
        let still_confirmed = store
            .complete(reservation.id, ReservationStatus::Cancelled, Utc::now())
            .await
            .unwrap();
        assert_eq!(still_confirmed.status, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn complete_unknown_reservation_fails() {
        let store = InMemoryReservationStore::new();
        let err = store
            .complete(ReservationId::new(), ReservationStatus::Cancelled, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }
}
