//! Saga entry point and reservation lookups.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use booking::{
    HotelGateway, NewReservation, Reservation, ReservationStore, SagaOrchestrator,
};
use chrono::NaiveDate;
use common::{RequestId, ReservationId, RoomId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ReservationStore, G: HotelGateway> {
    pub orchestrator: Arc<SagaOrchestrator<S, G>>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub room_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Client idempotency key; generated when absent.
    pub request_id: Option<String>,
    /// Identity of the booking user, supplied by the authentication layer
    /// in front of this service. Required; requests without it are
    /// rejected.
    pub user_id: Option<Uuid>,
}

// -- Response types --

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub request_id: String,
    pub user_id: Uuid,
    pub room_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub correlation_id: String,
}

impl From<Reservation> for BookingResponse {
    fn from(reservation: Reservation) -> Self {
        Self {
            id: reservation.id.as_uuid(),
            request_id: reservation.request_id.to_string(),
            user_id: reservation.user_id.as_uuid(),
            room_id: reservation.room_id.as_uuid(),
            start_date: reservation.start_date,
            end_date: reservation.end_date,
            status: reservation.status.to_string(),
            correlation_id: reservation.correlation_id.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct SuggestionResponse {
    pub id: Uuid,
    pub number: String,
    pub times_booked: i64,
    pub available: bool,
}

// -- Handlers --

/// POST /bookings — create a reservation and drive it to a terminal status.
///
/// The saga runs on a spawned task: a client disconnect does not abort it,
/// so no `PENDING` row is ever left behind by a dropped request.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError>
where
    S: ReservationStore + 'static,
    G: HotelGateway + 'static,
{
    let request_id = match req.request_id.as_deref() {
        Some(raw) => Some(
            RequestId::parse(raw)
                .ok_or_else(|| ApiError::BadRequest("request_id must not be blank".to_string()))?,
        ),
        None => None,
    };
    let user_id = req
        .user_id
        .map(UserId::from_uuid)
        .ok_or_else(|| ApiError::BadRequest("user_id is required".to_string()))?;

    let intent = NewReservation {
        user_id,
        room_id: RoomId::from_uuid(req.room_id),
        start_date: req.start_date,
        end_date: req.end_date,
        request_id,
    };

    let orchestrator = state.orchestrator.clone();
    let reservation = tokio::spawn(async move { orchestrator.create_reservation(intent).await })
        .await
        .map_err(|e| ApiError::Internal(format!("saga task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

/// GET /bookings/{id} — look up one reservation.
#[tracing::instrument(skip(state))]
pub async fn get<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError>
where
    S: ReservationStore,
    G: HotelGateway,
{
    let reservation = state
        .orchestrator
        .get_reservation(ReservationId::from_uuid(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("reservation {id} not found")))?;
    Ok(Json(reservation.into()))
}

/// GET /bookings/suggestions — rooms ordered for even booking distribution.
#[tracing::instrument(skip(state))]
pub async fn suggestions<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
) -> Result<Json<Vec<SuggestionResponse>>, ApiError>
where
    S: ReservationStore,
    G: HotelGateway,
{
    let rooms = state.orchestrator.room_suggestions().await?;
    Ok(Json(
        rooms
            .into_iter()
            .map(|r| SuggestionResponse {
                id: r.id.as_uuid(),
                number: r.number,
                times_booked: r.times_booked,
                available: r.available,
            })
            .collect(),
    ))
}
