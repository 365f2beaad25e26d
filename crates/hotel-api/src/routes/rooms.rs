//! Room listing and the lock endpoints driven by the booking saga.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use chrono::NaiveDate;
use common::{CorrelationId, RequestId, RoomId};
use hotel::{HotelStore, LockEngine, Room, RoomLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: HotelStore> {
    pub engine: LockEngine<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct HoldRequest {
    pub request_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct LockOpRequest {
    pub request_id: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct LockResponse {
    pub id: Uuid,
    pub request_id: String,
    pub room_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
}

impl From<RoomLock> for LockResponse {
    fn from(lock: RoomLock) -> Self {
        Self {
            id: lock.id.as_uuid(),
            request_id: lock.request_id.to_string(),
            room_id: lock.room_id.as_uuid(),
            start_date: lock.start_date,
            end_date: lock.end_date,
            status: lock.status.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct RoomResponse {
    pub id: Uuid,
    pub number: String,
    pub capacity: i32,
    pub times_booked: i64,
    pub available: bool,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.as_uuid(),
            number: room.number,
            capacity: room.capacity,
            times_booked: room.times_booked,
            available: room.available,
        }
    }
}

fn parse_request_id(raw: &str) -> Result<RequestId, ApiError> {
    RequestId::parse(raw).ok_or_else(|| ApiError::BadRequest("request_id is required".to_string()))
}

// -- Handlers --

/// POST /rooms/{room_id}/hold — place a hold on a date interval.
#[tracing::instrument(skip(state, req), fields(room_id = %room_id, correlation_id = %correlation_id))]
pub async fn hold<S: HotelStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(room_id): Path<Uuid>,
    Extension(correlation_id): Extension<CorrelationId>,
    Json(req): Json<HoldRequest>,
) -> Result<Json<LockResponse>, ApiError> {
    let request_id = parse_request_id(&req.request_id)?;
    let lock = state
        .engine
        .hold(
            request_id,
            RoomId::from_uuid(room_id),
            req.start_date,
            req.end_date,
            Some(correlation_id),
        )
        .await?;
    Ok(Json(lock.into()))
}

/// POST /rooms/{room_id}/confirm — promote a hold to a committed booking.
#[tracing::instrument(skip(state, req), fields(room_id = %room_id, correlation_id = %correlation_id))]
pub async fn confirm<S: HotelStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(room_id): Path<Uuid>,
    Extension(correlation_id): Extension<CorrelationId>,
    Json(req): Json<LockOpRequest>,
) -> Result<Json<LockResponse>, ApiError> {
    let request_id = parse_request_id(&req.request_id)?;
    let lock = state.engine.confirm(&request_id).await?;
    Ok(Json(lock.into()))
}

/// POST /rooms/{room_id}/release — compensating release of a hold.
#[tracing::instrument(skip(state, req), fields(room_id = %room_id, correlation_id = %correlation_id))]
pub async fn release<S: HotelStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(room_id): Path<Uuid>,
    Extension(correlation_id): Extension<CorrelationId>,
    Json(req): Json<LockOpRequest>,
) -> Result<Json<LockResponse>, ApiError> {
    let request_id = parse_request_id(&req.request_id)?;
    let lock = state.engine.release(&request_id).await?;
    Ok(Json(lock.into()))
}

/// GET /rooms — list rooms with booking statistics.
#[tracing::instrument(skip(state))]
pub async fn list<S: HotelStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<RoomResponse>>, ApiError> {
    let rooms = state.engine.store().list_rooms().await?;
    Ok(Json(rooms.into_iter().map(RoomResponse::from).collect()))
}

/// GET /rooms/{room_id} — look up one room.
#[tracing::instrument(skip(state))]
pub async fn get<S: HotelStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomResponse>, ApiError> {
    let room_id = RoomId::from_uuid(room_id);
    let room = state
        .engine
        .store()
        .get_room(room_id)
        .await?
        .ok_or(ApiError::Hotel(hotel::HotelError::RoomNotFound(room_id)))?;
    Ok(Json(room.into()))
}
