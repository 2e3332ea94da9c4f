use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{
    CancellationRecord, CustomerId, DeliveryCategory, DeliveryEarning, GeoPoint, OrderId,
    OrderStatus, PricingBreakdown, PusherId, WorkerCandidate,
};

/// Repository record for a delivery order moving through the status table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOrder {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub category: DeliveryCategory,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub pricing: PricingBreakdown,
    pub peak_applied: bool,
    pub status: OrderStatus,
    pub assigned_pusher: PusherId,
    pub pickup_distance_km: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub cancellation: Option<CancellationRecord>,
}

impl DeliveryOrder {
    pub fn status_view(&self) -> OrderStatusView {
        OrderStatusView {
            order_id: self.order_id.clone(),
            status: self.status.label(),
            category: self.category.label(),
            assigned_pusher: self.assigned_pusher.clone(),
            total: self.pricing.total,
            pusher_earning: self.pricing.pusher_earning,
            cancellation_fee: self.cancellation.as_ref().map(|record| record.fee),
        }
    }

    /// Ledger entry booked for the pusher once the order is delivered.
    pub fn earning(&self) -> DeliveryEarning {
        DeliveryEarning {
            price: self.pricing.base_price,
            commission: self.pricing.pusher_earning,
        }
    }
}

/// Storage abstraction so the dispatch service can be exercised in isolation.
pub trait OrderRepository: Send + Sync {
    fn insert(&self, order: DeliveryOrder) -> Result<DeliveryOrder, RepositoryError>;
    fn update(&self, order: DeliveryOrder) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &OrderId) -> Result<Option<DeliveryOrder>, RepositoryError>;
    /// True when the customer has an order that is neither delivered nor cancelled.
    fn has_active_order(&self, customer: &CustomerId) -> Result<bool, RepositoryError>;
}

/// Courier roster and ledger the dispatch service matches against.
pub trait PusherDirectory: Send + Sync {
    fn candidates(&self) -> Result<Vec<WorkerCandidate>, RepositoryError>;
    fn fetch(&self, id: &PusherId) -> Result<Option<WorkerCandidate>, RepositoryError>;
    fn record_assignment(&self, id: &PusherId) -> Result<(), RepositoryError>;
    fn record_release(&self, id: &PusherId) -> Result<(), RepositoryError>;
    fn record_delivery(&self, id: &PusherId, earning: DeliveryEarning)
        -> Result<(), RepositoryError>;
    fn ledger(&self, id: &PusherId) -> Result<Vec<DeliveryEarning>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Public representation of an order's progress.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusView {
    pub order_id: OrderId,
    pub status: &'static str,
    pub category: &'static str,
    pub assigned_pusher: PusherId,
    pub total: f64,
    pub pusher_earning: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_fee: Option<f64>,
}
