use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::dispatch::router::{
    self, CancellationFeeRequest, NearestPusherRequest, TransitionRequest,
};
use crate::dispatch::rules::RulesConfig;
use crate::dispatch::service::DispatchService;
use crate::dispatch::{dispatch_router, suggestion_router, CancelledBy, OrderStatus};

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&payload).expect("serialize payload"),
        ))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

fn order_payload(customer: &str) -> Value {
    json!({
        "customer_id": customer,
        "category": "bike",
        "base_price": 40.0,
        "pickup": { "lat": PICKUP.lat, "lng": PICKUP.lng },
        "dropoff": { "lat": DROPOFF.lat, "lng": DROPOFF.lng },
    })
}

#[tokio::test]
async fn cancellation_fee_handler_returns_fee_body() {
    let (service, _) = service_with(Vec::new(), SteppingClock::starting_at(at(11, 0)));

    let response = router::cancellation_fee_handler::<MemoryRepository, MemoryPushers>(
        State(service),
        Json(CancellationFeeRequest {
            order_value: 100.0,
            cancelled_by: CancelledBy::Customer,
            time_since_order: 10.0,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "fee": 20.0 }));
}

#[tokio::test]
async fn nearest_handler_returns_not_found_without_candidates() {
    let (service, _) = service_with(Vec::new(), SteppingClock::starting_at(at(11, 0)));

    let response = router::nearest_handler::<MemoryRepository, MemoryPushers>(
        State(service),
        Json(NearestPusherRequest {
            pickup_lat: PICKUP.lat,
            pickup_lng: PICKUP.lng,
            candidates: Vec::new(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = json_body(response).await;
    assert!(payload.get("error").and_then(Value::as_str).is_some());
}

#[tokio::test]
async fn transition_handler_rejects_unknown_labels() {
    let response = router::transition_handler(Json(TransitionRequest {
        current: "pending".to_string(),
        next: "teleported".to_string(),
    }))
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload.get("allowed"), Some(&json!(false)));
    assert_eq!(payload.get("next"), Some(&json!("teleported")));
}

#[tokio::test]
async fn order_handler_returns_not_found_for_unknown_id() {
    let (service, _) = service_with(Vec::new(), SteppingClock::starting_at(at(11, 0)));

    let response = router::order_handler::<MemoryRepository, MemoryPushers>(
        State(service),
        Path("ord-unknown".to_string()),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_order_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(DispatchService::with_clock(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryPushers::with(vec![candidate("p-1", 1.0)])),
        RulesConfig::default(),
        Arc::new(SteppingClock::starting_at(at(11, 0))),
    ));

    let response = router::create_order_handler::<UnavailableRepository, MemoryPushers>(
        State(service),
        Json(order_request("cust-1")),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn breakdown_route_prices_reference_quote() {
    let (service, _) = service_with(Vec::new(), SteppingClock::starting_at(at(11, 0)));
    let app = dispatch_router(service);

    let response = app
        .oneshot(post_json(
            "/api/v1/pricing/breakdown",
            json!({ "base_price": 40.0, "distance": 5.2, "category": "bike" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(
        payload,
        json!({
            "base_price": 40.0,
            "distance": 5.2,
            "category": "bike",
            "service_fee": 5.0,
            "platform_fee": 6.0,
            "pusher_earning": 34.0,
            "total": 45.0,
        })
    );
}

#[tokio::test]
async fn quote_route_applies_peak_pricing_from_service_clock() {
    let (service, _) = service_with(Vec::new(), SteppingClock::starting_at(at(18, 5)));
    let app = dispatch_router(service);

    let response = app
        .oneshot(post_json(
            "/api/v1/pricing/quote",
            json!({
                "base_price": 40.0,
                "pickup": { "lat": PICKUP.lat, "lng": PICKUP.lng },
                "dropoff": { "lat": DROPOFF.lat, "lng": DROPOFF.lng },
                "category": "truck",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload.get("peak_applied"), Some(&json!(true)));
    assert_eq!(payload.pointer("/breakdown/base_price"), Some(&json!(48.0)));
    assert_eq!(payload.pointer("/breakdown/distance"), Some(&json!(1.7)));
    assert_eq!(payload.pointer("/breakdown/category"), Some(&json!("truck")));
}

#[tokio::test]
async fn eligibility_routes_report_reasons() {
    let (service, _) = service_with(Vec::new(), SteppingClock::starting_at(at(11, 0)));
    let app = dispatch_router(service);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/eligibility/pusher",
            json!({ "float_balance": 0.0, "is_online": true, "active_deliveries": 0 }),
        ))
        .await
        .expect("route executes");
    let payload = json_body(response).await;
    assert_eq!(payload.get("can_accept"), Some(&json!(false)));
    assert!(payload
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .contains("float"));

    let response = app
        .oneshot(post_json(
            "/api/v1/eligibility/customer",
            json!({ "has_pending_payment": false, "has_active_delivery": false }),
        ))
        .await
        .expect("route executes");
    let payload = json_body(response).await;
    assert_eq!(payload.get("can_create"), Some(&json!(true)));
}

#[tokio::test]
async fn earnings_summary_route_handles_empty_ledger() {
    let (service, _) = service_with(Vec::new(), SteppingClock::starting_at(at(11, 0)));
    let app = dispatch_router(service);

    let response = app
        .oneshot(post_json(
            "/api/v1/earnings/summary",
            json!({ "deliveries": [] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload.get("total_deliveries"), Some(&json!(0)));
    assert_eq!(payload.get("average_earning"), Some(&json!(0.0)));
}

#[tokio::test]
async fn order_routes_drive_the_lifecycle() {
    let clock = SteppingClock::starting_at(at(11, 0));
    let (service, _) = service_with(vec![candidate("p-1", 1.0)], clock);
    let app = dispatch_router(service);

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/orders", order_payload("cust-http")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created.get("status"), Some(&json!("pending")));
    assert_eq!(created.get("assigned_pusher"), Some(&json!("p-1")));
    let order_id = created
        .get("order_id")
        .and_then(Value::as_str)
        .expect("order id")
        .to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/orders/{order_id}/status"),
            json!({ "status": "delivered" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    for status in [
        OrderStatus::Accepted,
        OrderStatus::Pickup,
        OrderStatus::Enroute,
        OrderStatus::Delivered,
    ] {
        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/v1/orders/{order_id}/status"),
                json!({ "status": status.label() }),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK, "advance to {status}");
    }

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/orders/{order_id}")))
        .await
        .expect("route executes");
    let order = json_body(response).await;
    assert_eq!(order.get("status"), Some(&json!("delivered")));

    let response = app
        .oneshot(get("/api/v1/pushers/p-1/earnings"))
        .await
        .expect("route executes");
    let summary = json_body(response).await;
    assert_eq!(summary.get("total_deliveries"), Some(&json!(1)));
    assert_eq!(summary.get("total_earnings"), Some(&json!(34.0)));
}

#[tokio::test]
async fn cancel_route_reports_fee_and_rejects_ineligible_customers() {
    let clock = SteppingClock::starting_at(at(11, 0));
    let (service, _) = service_with(vec![candidate("p-1", 1.0)], clock.clone());
    let app = dispatch_router(service);

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/orders", order_payload("cust-http")))
        .await
        .expect("route executes");
    let order_id = json_body(response)
        .await
        .get("order_id")
        .and_then(Value::as_str)
        .expect("order id")
        .to_string();

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/orders", order_payload("cust-http")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    clock.advance_minutes(10);
    let response = app
        .oneshot(post_json(
            &format!("/api/v1/orders/{order_id}/cancel"),
            json!({ "cancelled_by": "customer" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload.get("status"), Some(&json!("cancelled")));
    assert_eq!(payload.get("cancellation_fee"), Some(&json!(9.0)));
}

#[tokio::test]
async fn create_order_route_reports_unavailable_without_pushers() {
    let (service, _) = service_with(Vec::new(), SteppingClock::starting_at(at(11, 0)));
    let app = dispatch_router(service);

    let response = app
        .oneshot(post_json("/api/v1/orders", order_payload("cust-lonely")))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn suggestion_route_falls_back_without_advisor() {
    let app = suggestion_router(None);

    let response = app
        .oneshot(post_json(
            "/api/v1/suggestions/category",
            json!({ "description": "two bags of cement", "distance_km": 4.2 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = json_body(response).await;
    assert_eq!(payload.get("recommended_category"), Some(&json!("bike")));
    assert_eq!(payload.get("estimated_price"), Some(&json!(45.0)));
    assert_eq!(payload.get("fallback"), Some(&json!(true)));
}
