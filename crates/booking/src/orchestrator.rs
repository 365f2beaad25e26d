//! Saga orchestrator for reservation creation.

use chrono::{NaiveDate, Utc};
use common::{CorrelationId, RequestId, ReservationId, RoomId, UserId};

use crate::gateway::{GatewayError, HotelGateway, RoomSummary};
use crate::reservation::{Reservation, ReservationStatus};
use crate::store::ReservationStore;
use crate::{BookingError, Result};

/// How long a duplicate caller waits for the winning saga to reach a
/// terminal status. Sized above the gateway's worst case of three calls,
/// each with a full retry budget.
const DUPLICATE_WAIT_BUDGET: std::time::Duration = std::time::Duration::from_secs(60);

/// Poll cadence while waiting on the winning saga.
const DUPLICATE_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(50);

/// A reservation intent as accepted at the saga entry point.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Optional client idempotency key; generated when absent, and the
    /// choice is opaque to the client.
    pub request_id: Option<RequestId>,
}

/// Orchestrates the two-step reservation saga against the hotel service.
///
/// Forward path: persist `PENDING` → hotel `hold` → hotel `confirm` →
/// persist `CONFIRMED`. Any forward failure triggers the compensating
/// `release` and a `CANCELLED` terminal write. Compensation failures are
/// logged and swallowed: the hotel's expiration sweeper frees the interval
/// within one hold TTL, so a lost release is recoverable.
pub struct SagaOrchestrator<S, G> {
    store: S,
    gateway: G,
}

impl<S, G> SagaOrchestrator<S, G>
where
    S: ReservationStore,
    G: HotelGateway,
{
    /// Creates a new orchestrator.
    pub fn new(store: S, gateway: G) -> Self {
        Self { store, gateway }
    }

    /// Returns the underlying reservation store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a reservation, blocking until it reaches a terminal status.
    ///
    /// Idempotent by `request_id`: a repeat call returns the previously
    /// persisted reservation without issuing any hotel calls.
    #[tracing::instrument(skip(self, intent), fields(room_id = %intent.room_id, user_id = %intent.user_id))]
    pub async fn create_reservation(&self, intent: NewReservation) -> Result<Reservation> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        validate_stay(intent.start_date, intent.end_date, Utc::now().date_naive())?;
        let request_id = intent.request_id.unwrap_or_else(RequestId::generate);

        // Idempotency probe: the client sees the outcome of the original
        // request. A row that is still PENDING belongs to an in-flight saga;
        // wait it out rather than leaking a non-terminal status.
        if let Some(existing) = self.store.find_by_request_id(&request_id).await? {
            if existing.status.is_terminal() {
                tracing::info!(
                    request_id = %request_id,
                    reservation_id = %existing.id,
                    status = %existing.status,
                    "replayed request, returning existing reservation"
                );
                return Ok(existing);
            }
            tracing::info!(
                request_id = %request_id,
                reservation_id = %existing.id,
                "replayed request while its saga is in flight, waiting"
            );
            return self.await_terminal(&request_id).await;
        }

        let correlation_id = CorrelationId::generate("booking");
        let pending = Reservation::pending(
            request_id.clone(),
            intent.user_id,
            intent.room_id,
            intent.start_date,
            intent.end_date,
            correlation_id.clone(),
            Utc::now(),
        );

        // Commit point: once the PENDING row exists, this saga owns the
        // reservation and must drive it to a terminal status.
        let reservation = match self.store.insert_pending(pending).await {
            Ok(r) => r,
            Err(BookingError::DuplicateRequest(_)) => {
                // lost the entry race; the winner drives the saga, so wait
                // for its terminal outcome
                return self.await_terminal(&request_id).await;
            }
            Err(e) => return Err(e),
        };
        tracing::info!(
            correlation_id = %correlation_id,
            reservation_id = %reservation.id,
            "reservation entered PENDING"
        );

        let outcome = match self.run_forward(&reservation).await {
            Ok(()) => {
                metrics::counter!("saga_completed").increment(1);
                ReservationStatus::Confirmed
            }
            Err(e) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "saga forward path failed, compensating"
                );
                self.compensate(&reservation).await;
                metrics::counter!("saga_compensated").increment(1);
                ReservationStatus::Cancelled
            }
        };

        let reservation = self
            .store
            .complete(reservation.id, outcome, Utc::now())
            .await?;

        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        tracing::info!(
            correlation_id = %correlation_id,
            reservation_id = %reservation.id,
            status = %reservation.status,
            "saga finished"
        );
        Ok(reservation)
    }

    /// Hotel forward path: hold, then confirm. No pipelining; `confirm` is
    /// only issued after `hold` returned a classifiable outcome.
    async fn run_forward(&self, reservation: &Reservation) -> std::result::Result<(), GatewayError> {
        self.gateway
            .hold(
                reservation.room_id,
                &reservation.request_id,
                reservation.start_date,
                reservation.end_date,
                &reservation.correlation_id,
            )
            .await?;
        self.gateway
            .confirm(
                reservation.room_id,
                &reservation.request_id,
                &reservation.correlation_id,
            )
            .await?;
        Ok(())
    }

    /// Compensating release. Failures are swallowed: the hotel sweeper
    /// expires the orphaned hold within one TTL.
    async fn compensate(&self, reservation: &Reservation) {
        match self
            .gateway
            .release(
                reservation.room_id,
                &reservation.request_id,
                &reservation.correlation_id,
            )
            .await
        {
            Ok(lock) => {
                tracing::info!(
                    correlation_id = %reservation.correlation_id,
                    lock_status = %lock.status,
                    "compensation released the hold"
                );
            }
            Err(e) => {
                metrics::counter!("saga_compensation_failures").increment(1);
                tracing::error!(
                    correlation_id = %reservation.correlation_id,
                    error = %e,
                    "compensation failed; the hotel sweeper will expire the hold"
                );
            }
        }
    }

    /// Waits for another caller's in-flight saga on the same `request_id`
    /// to finish, polling until the row is terminal.
    ///
    /// A reservation is never returned to a client while still PENDING; if
    /// the winning saga has not finished within the wait budget, the caller
    /// gets the uniqueness violation and can re-read later.
    async fn await_terminal(&self, request_id: &RequestId) -> Result<Reservation> {
        let deadline = std::time::Instant::now() + DUPLICATE_WAIT_BUDGET;
        loop {
            let reservation = self
                .store
                .find_by_request_id(request_id)
                .await?
                .ok_or_else(|| BookingError::DuplicateRequest(request_id.clone()))?;
            if reservation.status.is_terminal() {
                return Ok(reservation);
            }
            if std::time::Instant::now() >= deadline {
                tracing::warn!(
                    request_id = %request_id,
                    reservation_id = %reservation.id,
                    "gave up waiting for the winning saga to finish"
                );
                return Err(BookingError::DuplicateRequest(request_id.clone()));
            }
            tokio::time::sleep(DUPLICATE_POLL_INTERVAL).await;
        }
    }

    /// Looks up a reservation by id.
    pub async fn get_reservation(&self, id: ReservationId) -> Result<Option<Reservation>> {
        self.store.find_by_id(id).await
    }

    /// Rooms ordered for even booking distribution:
    /// least-booked first, id as the tie-break.
    pub async fn room_suggestions(&self) -> Result<Vec<RoomSummary>> {
        let mut rooms = self.gateway.list_rooms().await?;
        rooms.sort_by(|a, b| {
            a.times_booked
                .cmp(&b.times_booked)
                .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
        });
        Ok(rooms)
    }
}

/// Validates the stay interval at the saga entry, before any row is
/// written. The hotel service applies the same rule on its side.
pub fn validate_stay(start_date: NaiveDate, end_date: NaiveDate, today: NaiveDate) -> Result<()> {
    if start_date >= end_date {
        return Err(BookingError::InvalidDates(format!(
            "start date {start_date} must be before end date {end_date}"
        )));
    }
    if start_date < today {
        return Err(BookingError::InvalidDates(format!(
            "start date {start_date} is in the past"
        )));
    }
    Ok(())
}
