use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{DeliveryCategory, GeoPoint, PricingBreakdown};
use super::rules::{calculate_distance, Clock, DispatchRules, FixedClock};

/// Inputs needed to price a pickup-to-dropoff delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub base_price: f64,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub category: DeliveryCategory,
}

/// Priced delivery with the peak adjustment already folded into `breakdown.base_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub breakdown: PricingBreakdown,
    pub requested_base_price: f64,
    pub peak_applied: bool,
    pub quoted_at: NaiveDateTime,
}

impl DispatchRules {
    pub fn quote(&self, request: &QuoteRequest, clock: &dyn Clock) -> DeliveryQuote {
        // Peak decision and timestamp share a single clock read.
        let quoted_at = clock.now();
        let pinned = FixedClock::new(quoted_at);
        let peak_applied = self.is_peak_hours(&pinned);
        let base_price = self.apply_peak_pricing(request.base_price, &pinned);

        let distance = calculate_distance(
            request.pickup.lat,
            request.pickup.lng,
            request.dropoff.lat,
            request.dropoff.lng,
        );

        DeliveryQuote {
            breakdown: self.calculate_delivery_price(base_price, distance, request.category),
            requested_base_price: request.base_price,
            peak_applied,
            quoted_at,
        }
    }
}
