use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    CancelledBy, DeliveryCategory, DeliveryEarning, EarningsSummary, OrderId, OrderStatus,
    PusherId, WorkerCandidate,
};
use super::quote::QuoteRequest;
use super::repository::{DeliveryOrder, OrderRepository, OrderStatusView, PusherDirectory};
use super::rules::{calculate_pusher_earnings, can_transition_labels};
use super::service::{DispatchService, OrderRequest, OrderServiceError};
use super::suggestion::{suggest_category, CategoryAdvisor, SuggestionRequest};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub(crate) struct BreakdownRequest {
    pub(crate) base_price: f64,
    pub(crate) distance: f64,
    pub(crate) category: DeliveryCategory,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PusherEligibilityRequest {
    pub(crate) float_balance: f64,
    pub(crate) is_online: bool,
    pub(crate) active_deliveries: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CustomerEligibilityRequest {
    pub(crate) has_pending_payment: bool,
    pub(crate) has_active_delivery: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CancellationFeeRequest {
    pub(crate) order_value: f64,
    pub(crate) cancelled_by: CancelledBy,
    pub(crate) time_since_order: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NearestPusherRequest {
    pub(crate) pickup_lat: f64,
    pub(crate) pickup_lng: f64,
    #[serde(default)]
    pub(crate) candidates: Vec<WorkerCandidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EarningsRequest {
    #[serde(default)]
    pub(crate) deliveries: Vec<DeliveryEarning>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionRequest {
    pub(crate) current: String,
    pub(crate) next: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdvanceRequest {
    pub(crate) status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CancelRequest {
    pub(crate) cancelled_by: CancelledBy,
}

#[derive(Debug, Serialize)]
pub(crate) struct NearestPusherResponse {
    pub(crate) pusher: WorkerCandidate,
    pub(crate) distance_km: f64,
}

/// Router exposing the pricing rules and the order board over HTTP.
pub fn dispatch_router<R, P>(service: Arc<DispatchService<R, P>>) -> Router
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    Router::new()
        .route("/api/v1/pricing/quote", post(quote_handler::<R, P>))
        .route("/api/v1/pricing/breakdown", post(breakdown_handler::<R, P>))
        .route(
            "/api/v1/eligibility/pusher",
            post(pusher_eligibility_handler::<R, P>),
        )
        .route(
            "/api/v1/eligibility/customer",
            post(customer_eligibility_handler::<R, P>),
        )
        .route(
            "/api/v1/cancellations/fee",
            post(cancellation_fee_handler::<R, P>),
        )
        .route("/api/v1/matching/nearest", post(nearest_handler::<R, P>))
        .route("/api/v1/earnings/summary", post(earnings_summary_handler))
        .route("/api/v1/status/transition", post(transition_handler))
        .route("/api/v1/orders", post(create_order_handler::<R, P>))
        .route("/api/v1/orders/:order_id", get(order_handler::<R, P>))
        .route(
            "/api/v1/orders/:order_id/status",
            post(advance_handler::<R, P>),
        )
        .route(
            "/api/v1/orders/:order_id/cancel",
            post(cancel_handler::<R, P>),
        )
        .route(
            "/api/v1/pushers/:pusher_id/earnings",
            get(pusher_earnings_handler::<R, P>),
        )
        .with_state(service)
}

/// Router exposing category suggestions; `None` serves the static fallback.
pub fn suggestion_router(advisor: Option<Arc<dyn CategoryAdvisor>>) -> Router {
    Router::new()
        .route("/api/v1/suggestions/category", post(suggestion_handler))
        .with_state(advisor)
}

pub(crate) async fn quote_handler<R, P>(
    State(service): State<Arc<DispatchService<R, P>>>,
    Json(request): Json<QuoteRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    let quote = service.rules().quote(&request, service.clock());
    (StatusCode::OK, Json(quote)).into_response()
}

pub(crate) async fn breakdown_handler<R, P>(
    State(service): State<Arc<DispatchService<R, P>>>,
    Json(request): Json<BreakdownRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    let breakdown = service.rules().calculate_delivery_price(
        request.base_price,
        request.distance,
        request.category,
    );
    (StatusCode::OK, Json(breakdown)).into_response()
}

pub(crate) async fn pusher_eligibility_handler<R, P>(
    State(service): State<Arc<DispatchService<R, P>>>,
    Json(request): Json<PusherEligibilityRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    let eligibility = service.rules().can_pusher_accept_job(
        request.float_balance,
        request.is_online,
        request.active_deliveries,
    );
    (StatusCode::OK, Json(eligibility)).into_response()
}

pub(crate) async fn customer_eligibility_handler<R, P>(
    State(service): State<Arc<DispatchService<R, P>>>,
    Json(request): Json<CustomerEligibilityRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    let eligibility = service
        .rules()
        .can_customer_create_order(request.has_pending_payment, request.has_active_delivery);
    (StatusCode::OK, Json(eligibility)).into_response()
}

pub(crate) async fn cancellation_fee_handler<R, P>(
    State(service): State<Arc<DispatchService<R, P>>>,
    Json(request): Json<CancellationFeeRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    let fee = service.rules().calculate_cancellation_fee(
        request.order_value,
        request.cancelled_by,
        request.time_since_order,
    );
    (StatusCode::OK, Json(json!({ "fee": fee }))).into_response()
}

pub(crate) async fn nearest_handler<R, P>(
    State(service): State<Arc<DispatchService<R, P>>>,
    Json(request): Json<NearestPusherRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    match service.rules().find_nearest_pusher_with_distance(
        request.pickup_lat,
        request.pickup_lng,
        &request.candidates,
    ) {
        Some((pusher, distance_km)) => {
            let body = NearestPusherResponse {
                pusher: pusher.clone(),
                distance_km,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        None => {
            let payload = json!({
                "error": OrderServiceError::NoPusherAvailable.to_string(),
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn earnings_summary_handler(Json(request): Json<EarningsRequest>) -> Response {
    let summary = calculate_pusher_earnings(&request.deliveries);
    (StatusCode::OK, Json(summary)).into_response()
}

pub(crate) async fn transition_handler(Json(request): Json<TransitionRequest>) -> Response {
    let allowed = can_transition_labels(&request.current, &request.next);
    let payload = json!({
        "current": request.current,
        "next": request.next,
        "allowed": allowed,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn create_order_handler<R, P>(
    State(service): State<Arc<DispatchService<R, P>>>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderStatusView>), AppError>
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    let order = service.create_order(request)?;
    Ok((StatusCode::CREATED, Json(order.status_view())))
}

pub(crate) async fn order_handler<R, P>(
    State(service): State<Arc<DispatchService<R, P>>>,
    Path(order_id): Path<String>,
) -> Result<Json<DeliveryOrder>, AppError>
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    let order = service.get(&OrderId(order_id))?;
    Ok(Json(order))
}

pub(crate) async fn advance_handler<R, P>(
    State(service): State<Arc<DispatchService<R, P>>>,
    Path(order_id): Path<String>,
    Json(request): Json<AdvanceRequest>,
) -> Result<Json<OrderStatusView>, AppError>
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    let order = service.advance(&OrderId(order_id), request.status)?;
    Ok(Json(order.status_view()))
}

pub(crate) async fn cancel_handler<R, P>(
    State(service): State<Arc<DispatchService<R, P>>>,
    Path(order_id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<OrderStatusView>, AppError>
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    let order = service.cancel(&OrderId(order_id), request.cancelled_by)?;
    Ok(Json(order.status_view()))
}

pub(crate) async fn pusher_earnings_handler<R, P>(
    State(service): State<Arc<DispatchService<R, P>>>,
    Path(pusher_id): Path<String>,
) -> Result<Json<EarningsSummary>, AppError>
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    let summary = service.earnings(&PusherId(pusher_id))?;
    Ok(Json(summary))
}

pub(crate) async fn suggestion_handler(
    State(advisor): State<Option<Arc<dyn CategoryAdvisor>>>,
    Json(request): Json<SuggestionRequest>,
) -> Response {
    let suggestion = suggest_category(advisor.as_deref(), &request).await;
    (StatusCode::OK, Json(suggestion)).into_response()
}
