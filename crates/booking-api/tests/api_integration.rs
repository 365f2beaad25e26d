//! Integration tests for the booking service HTTP surface.
//!
//! The hotel side is the in-memory gateway double, so every saga outcome
//! (confirmed, conflict-cancelled, compensation) can be driven without a
//! hotel process.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use booking::{InMemoryHotelGateway, InMemoryReservationStore, RoomSummary};
use booking_api::routes::bookings::AppState;
use chrono::{Duration, Utc};
use common::RoomId;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;
use uuid::Uuid;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

type TestState = Arc<AppState<InMemoryReservationStore, InMemoryHotelGateway>>;

fn setup() -> (axum::Router, TestState, InMemoryHotelGateway) {
    let gateway = InMemoryHotelGateway::new();
    let state = booking_api::create_state(InMemoryReservationStore::new(), gateway.clone());
    let app = booking_api::create_app(state.clone(), get_metrics_handle());
    (app, state, gateway)
}

fn booking_body(request_id: Option<&str>) -> serde_json::Value {
    let start = Utc::now().date_naive() + Duration::days(1);
    let mut body = serde_json::json!({
        "room_id": Uuid::new_v4(),
        "user_id": Uuid::new_v4(),
        "start_date": start,
        "end_date": start + Duration::days(2),
    });
    if let Some(id) = request_id {
        body["request_id"] = serde_json::Value::String(id.to_string());
    }
    body
}

fn post_booking(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/bookings")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _, _) = setup();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "booking");
}

#[tokio::test]
async fn booking_confirms_on_the_happy_path() {
    let (app, _, gateway) = setup();

    let response = app
        .oneshot(post_booking(booking_body(Some("req-happy"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "CONFIRMED");
    assert_eq!(json["request_id"], "req-happy");
    assert!(json["correlation_id"].as_str().unwrap().starts_with("booking-"));
    assert_eq!(gateway.hold_calls(), 1);
    assert_eq!(gateway.confirm_calls(), 1);
}

#[tokio::test]
async fn booking_cancels_on_hold_conflict() {
    let (app, _, gateway) = setup();
    gateway.set_conflict_on_hold(true);

    let response = app
        .oneshot(post_booking(booking_body(Some("req-conflict"))))
        .await
        .unwrap();

    // the response is still terminal, just CANCELLED
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "CANCELLED");
}

#[tokio::test]
async fn booking_cancels_and_releases_on_confirm_failure() {
    let (app, _, gateway) = setup();
    gateway.set_fail_on_confirm(true);

    let response = app
        .oneshot(post_booking(booking_body(Some("req-comp"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "CANCELLED");
    assert_eq!(gateway.release_calls(), 1);
}

#[tokio::test]
async fn repeated_booking_replays_the_original_outcome() {
    let (app, _, gateway) = setup();
    let body = booking_body(Some("req-replay"));

    let first = body_json(
        app.clone().oneshot(post_booking(body.clone())).await.unwrap(),
    )
    .await;
    let second = body_json(app.oneshot(post_booking(body)).await.unwrap()).await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["status"], second["status"]);
    assert_eq!(gateway.hold_calls(), 1);
}

#[tokio::test]
async fn booking_rejects_past_start_date() {
    let (app, _, gateway) = setup();
    let start = Utc::now().date_naive() - Duration::days(2);
    let body = serde_json::json!({
        "room_id": Uuid::new_v4(),
        "user_id": Uuid::new_v4(),
        "start_date": start,
        "end_date": start + Duration::days(3),
    });

    let response = app.oneshot(post_booking(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(gateway.hold_calls(), 0);
}

#[tokio::test]
async fn booking_rejects_missing_user_id() {
    let (app, _, gateway) = setup();
    let mut body = booking_body(Some("req-no-user"));
    body.as_object_mut().unwrap().remove("user_id");

    let response = app.oneshot(post_booking(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("user_id"));
    assert_eq!(gateway.hold_calls(), 0);
}

#[tokio::test]
async fn booking_rejects_blank_request_id() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(post_booking(booking_body(Some("   "))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lookup_returns_persisted_reservation() {
    let (app, _, _) = setup();

    let created = body_json(
        app.clone()
            .oneshot(post_booking(booking_body(Some("req-lookup"))))
            .await
            .unwrap(),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/bookings/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["request_id"], "req-lookup");

    // unknown id is a 404
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/bookings/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn suggestions_come_back_least_booked_first() {
    let (app, _, gateway) = setup();
    gateway.set_rooms(vec![
        RoomSummary {
            id: RoomId::new(),
            number: "busy".into(),
            times_booked: 9,
            available: true,
        },
        RoomSummary {
            id: RoomId::new(),
            number: "quiet".into(),
            times_booked: 1,
            available: true,
        },
    ]);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/bookings/suggestions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rooms = json.as_array().unwrap();
    assert_eq!(rooms[0]["number"], "quiet");
    assert_eq!(rooms[1]["number"], "busy");
}

#[tokio::test]
async fn correlation_header_is_echoed() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Correlation-Id", "client-abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("X-Correlation-Id").unwrap(),
        "client-abc"
    );
}
