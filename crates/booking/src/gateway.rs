//! Hotel gateway trait, error taxonomy, and in-memory test double.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{CorrelationId, LockId, RequestId, RoomId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The hotel's view of a lock, as returned by its lock endpoints.
///
/// The saga depends only on the success/failure classification of each
/// call; this payload is advisory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockSnapshot {
    pub id: LockId,
    pub request_id: RequestId,
    pub room_id: RoomId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
}

/// A room as listed by the hotel service, for suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub number: String,
    pub times_booked: i64,
    pub available: bool,
}

/// Classified failures from the hotel gateway.
///
/// Only [`GatewayError::Unavailable`] and retryable [`GatewayError::Http`]
/// errors are retried inside the gateway; everything else is definitive and
/// reaches the saga immediately.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 409: overlapping lock or room unavailable. Definitive.
    #[error("hotel reported a conflict: {0}")]
    Conflict(String),

    /// 404: unknown room or unknown request id. Definitive.
    #[error("hotel reported not found: {0}")]
    NotFound(String),

    /// Other 4xx: the hotel rejected the request as invalid. Definitive.
    #[error("hotel rejected the request: {0}")]
    Rejected(String),

    /// 408/429/5xx, or retry budget exhausted on such a status. Retryable.
    #[error("hotel unavailable: {0}")]
    Unavailable(String),

    /// Transport-level failure from the HTTP client.
    #[error("hotel transport error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GatewayError {
    /// Returns true if the gateway may retry the call.
    ///
    /// Timeouts and connection failures are retryable; response-decoding
    /// failures are not, since the request already took effect.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Unavailable(_) => true,
            GatewayError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Wire-level client to the hotel service's lock surface.
///
/// Every call carries the reservation's correlation id. Dropping a pending
/// call's future cancels it; no further retries are attempted after
/// cancellation.
#[async_trait]
pub trait HotelGateway: Send + Sync {
    /// POST `/rooms/{room_id}/hold`
    async fn hold(
        &self,
        room_id: RoomId,
        request_id: &RequestId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        correlation_id: &CorrelationId,
    ) -> Result<LockSnapshot, GatewayError>;

    /// POST `/rooms/{room_id}/confirm`
    async fn confirm(
        &self,
        room_id: RoomId,
        request_id: &RequestId,
        correlation_id: &CorrelationId,
    ) -> Result<LockSnapshot, GatewayError>;

    /// POST `/rooms/{room_id}/release`
    async fn release(
        &self,
        room_id: RoomId,
        request_id: &RequestId,
        correlation_id: &CorrelationId,
    ) -> Result<LockSnapshot, GatewayError>;

    /// GET `/rooms` — room listing for suggestions.
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, GatewayError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    locks: HashMap<RequestId, LockSnapshot>,
    rooms: Vec<RoomSummary>,
    hold_calls: u64,
    confirm_calls: u64,
    release_calls: u64,
    conflict_on_hold: bool,
    fail_on_confirm: bool,
    fail_on_release: bool,
}

/// In-memory hotel gateway for testing.
///
/// Tracks call counts and supports failure injection per operation, so
/// saga tests can drive every compensation path without a hotel service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHotelGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryHotelGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next holds fail with a conflict.
    pub fn set_conflict_on_hold(&self, conflict: bool) {
        self.state.write().unwrap().conflict_on_hold = conflict;
    }

    /// Makes confirm calls fail as unavailable.
    pub fn set_fail_on_confirm(&self, fail: bool) {
        self.state.write().unwrap().fail_on_confirm = fail;
    }

    /// Makes release calls fail as unavailable.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.state.write().unwrap().fail_on_release = fail;
    }

    /// Seeds the room listing returned by `list_rooms`.
    pub fn set_rooms(&self, rooms: Vec<RoomSummary>) {
        self.state.write().unwrap().rooms = rooms;
    }

    /// Returns how many hold calls were made.
    pub fn hold_calls(&self) -> u64 {
        self.state.read().unwrap().hold_calls
    }

    /// Returns how many confirm calls were made.
    pub fn confirm_calls(&self) -> u64 {
        self.state.read().unwrap().confirm_calls
    }

    /// Returns how many release calls were made.
    pub fn release_calls(&self) -> u64 {
        self.state.read().unwrap().release_calls
    }

    /// Returns the lock recorded for a request id, if any.
    pub fn lock(&self, request_id: &RequestId) -> Option<LockSnapshot> {
        self.state.read().unwrap().locks.get(request_id).cloned()
    }
}

#[async_trait]
impl HotelGateway for InMemoryHotelGateway {
    async fn hold(
        &self,
        room_id: RoomId,
        request_id: &RequestId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        _correlation_id: &CorrelationId,
    ) -> Result<LockSnapshot, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.hold_calls += 1;

        if let Some(existing) = state.locks.get(request_id) {
            return Ok(existing.clone());
        }
        if state.conflict_on_hold {
            return Err(GatewayError::Conflict(
                "room is already locked for the requested dates".to_string(),
            ));
        }

        let snapshot = LockSnapshot {
            id: LockId::new(),
            request_id: request_id.clone(),
            room_id,
            start_date,
            end_date,
            status: "HELD".to_string(),
        };
        state.locks.insert(request_id.clone(), snapshot.clone());
        Ok(snapshot)
    }

    async fn confirm(
        &self,
        _room_id: RoomId,
        request_id: &RequestId,
        _correlation_id: &CorrelationId,
    ) -> Result<LockSnapshot, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.confirm_calls += 1;

        if state.fail_on_confirm {
            return Err(GatewayError::Unavailable("injected failure".to_string()));
        }
        let lock = state
            .locks
            .get_mut(request_id)
            .ok_or_else(|| GatewayError::NotFound(format!("no lock for {request_id}")))?;
        lock.status = "CONFIRMED".to_string();
        Ok(lock.clone())
    }

    async fn release(
        &self,
        _room_id: RoomId,
        request_id: &RequestId,
        _correlation_id: &CorrelationId,
    ) -> Result<LockSnapshot, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.release_calls += 1;

        if state.fail_on_release {
            return Err(GatewayError::Unavailable("injected failure".to_string()));
        }
        let lock = state
            .locks
            .get_mut(request_id)
            .ok_or_else(|| GatewayError::NotFound(format!("no lock for {request_id}")))?;
        if lock.status == "HELD" {
            lock.status = "RELEASED".to_string();
        }
        Ok(lock.clone())
    }

    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, GatewayError> {
        Ok(self.state.read().unwrap().rooms.clone())
    }
}
