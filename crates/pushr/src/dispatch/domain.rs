use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for delivery orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

/// Identifier wrapper for courier workers ("pushers").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PusherId(pub String);

/// Identifier wrapper for ordering customers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

/// Vehicle class a delivery is carried with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryCategory {
    Walking,
    Wheelbarrow,
    Bike,
    Truck,
}

impl DeliveryCategory {
    pub fn ordered() -> [DeliveryCategory; 4] {
        [
            DeliveryCategory::Walking,
            DeliveryCategory::Wheelbarrow,
            DeliveryCategory::Bike,
            DeliveryCategory::Truck,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            DeliveryCategory::Walking => "walking",
            DeliveryCategory::Wheelbarrow => "wheelbarrow",
            DeliveryCategory::Bike => "bike",
            DeliveryCategory::Truck => "truck",
        }
    }
}

impl fmt::Display for DeliveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeliveryCategory {
    type Err = UnknownLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|category| category.label() == normalized)
            .ok_or_else(|| UnknownLabel(value.to_string()))
    }
}

/// Lifecycle position of a delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Pickup,
    Enroute,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn ordered() -> [OrderStatus; 6] {
        [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::Pickup,
            OrderStatus::Enroute,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Pickup => "pickup",
            OrderStatus::Enroute => "enroute",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Statuses during which the assigned pusher holds one of their active-delivery slots.
    pub fn occupies_pusher(self) -> bool {
        matches!(
            self,
            OrderStatus::Accepted | OrderStatus::Pickup | OrderStatus::Enroute
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| UnknownLabel(value.to_string()))
    }
}

/// Party that initiated a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelledBy {
    Customer,
    Pusher,
    System,
}

impl CancelledBy {
    pub fn label(self) -> &'static str {
        match self {
            CancelledBy::Customer => "customer",
            CancelledBy::Pusher => "pusher",
            CancelledBy::System => "system",
        }
    }
}

/// Raised when a category or status label does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized label '{0}'")]
pub struct UnknownLabel(pub String);

/// WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Snapshot of a courier considered for a job. Read-only to the rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerCandidate {
    pub id: PusherId,
    pub lat: f64,
    pub lng: f64,
    pub float_balance: f64,
    pub is_online: bool,
    pub active_deliveries: u32,
    pub rating: f64,
}

impl WorkerCandidate {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Price split for a single delivery request.
///
/// `total` is always `base_price + service_fee`. The platform fee and pusher
/// earning are rounded independently and may not add up to `base_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub base_price: f64,
    pub distance: f64,
    pub category: DeliveryCategory,
    pub service_fee: f64,
    pub platform_fee: f64,
    pub pusher_earning: f64,
    pub total: f64,
}

/// Reasons a pusher may not take on another job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum PusherRejection {
    #[error("You must be online to accept jobs")]
    Offline,
    #[error(
        "Insufficient float balance. A minimum float of {minimum} is required to accept jobs, please top up your float"
    )]
    InsufficientFloat { minimum: f64 },
    #[error("You have reached the maximum number of active deliveries ({maximum})")]
    ActiveDeliveryLimit { maximum: u32 },
}

/// Reasons a customer may not open a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum CustomerRejection {
    #[error("Please complete payment for your previous order before creating a new one")]
    PendingPayment,
    #[error("You already have an active delivery in progress")]
    ActiveDelivery,
}

/// Outcome of the pusher eligibility check. `reason` is set exactly when `can_accept` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PusherEligibility {
    pub can_accept: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Result<(), PusherRejection>> for PusherEligibility {
    fn from(check: Result<(), PusherRejection>) -> Self {
        match check {
            Ok(()) => Self {
                can_accept: true,
                reason: None,
            },
            Err(rejection) => Self {
                can_accept: false,
                reason: Some(rejection.to_string()),
            },
        }
    }
}

/// Outcome of the customer eligibility check. `reason` is set exactly when `can_create` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerEligibility {
    pub can_create: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Result<(), CustomerRejection>> for CustomerEligibility {
    fn from(check: Result<(), CustomerRejection>) -> Self {
        match check {
            Ok(()) => Self {
                can_create: true,
                reason: None,
            },
            Err(rejection) => Self {
                can_create: false,
                reason: Some(rejection.to_string()),
            },
        }
    }
}

/// A completed delivery as seen by the earnings ledger.
///
/// `commission` holds the amount the pusher took home; `price - commission`
/// is the platform's share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEarning {
    pub price: f64,
    pub commission: f64,
}

/// Aggregated earnings across a pusher's completed deliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsSummary {
    pub total_earnings: f64,
    pub total_deliveries: usize,
    pub average_earning: f64,
    pub platform_commission: f64,
}

/// Record kept on an order once it has been cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub cancelled_by: CancelledBy,
    pub fee: f64,
    pub minutes_since_order: f64,
    pub cancelled_at: NaiveDateTime,
}
