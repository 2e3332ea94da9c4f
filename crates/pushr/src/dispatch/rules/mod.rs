mod cancellation;
mod config;
mod earnings;
mod eligibility;
mod geo;
mod matching;
mod peak;
mod pricing;
mod transitions;

pub use config::{PeakWindow, RulesConfig};
pub use earnings::calculate_pusher_earnings;
pub use geo::calculate_distance;
pub use peak::{Clock, FixedClock, SystemClock};
pub use transitions::{allowed_transitions, can_transition_labels, can_transition_status};

use super::domain::{
    CancelledBy, CustomerEligibility, CustomerRejection, DeliveryCategory, PricingBreakdown,
    PusherEligibility, PusherRejection, WorkerCandidate,
};

/// Stateless rules engine applying a [`RulesConfig`] to pricing, eligibility and matching.
#[derive(Debug, Clone, Default)]
pub struct DispatchRules {
    config: RulesConfig,
}

impl DispatchRules {
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn calculate_delivery_price(
        &self,
        base_price: f64,
        distance: f64,
        category: DeliveryCategory,
    ) -> PricingBreakdown {
        pricing::price_delivery(base_price, distance, category, &self.config)
    }

    pub fn can_pusher_accept_job(
        &self,
        float_balance: f64,
        is_online: bool,
        active_deliveries: u32,
    ) -> PusherEligibility {
        self.check_pusher(float_balance, is_online, active_deliveries).into()
    }

    /// Typed form of [`Self::can_pusher_accept_job`].
    pub fn check_pusher(
        &self,
        float_balance: f64,
        is_online: bool,
        active_deliveries: u32,
    ) -> Result<(), PusherRejection> {
        eligibility::check_pusher(float_balance, is_online, active_deliveries, &self.config)
    }

    pub fn can_customer_create_order(
        &self,
        has_pending_payment: bool,
        has_active_delivery: bool,
    ) -> CustomerEligibility {
        self.check_customer(has_pending_payment, has_active_delivery).into()
    }

    /// Typed form of [`Self::can_customer_create_order`].
    pub fn check_customer(
        &self,
        has_pending_payment: bool,
        has_active_delivery: bool,
    ) -> Result<(), CustomerRejection> {
        eligibility::check_customer(has_pending_payment, has_active_delivery)
    }

    /// Fee owed by the customer; never negative and never above the configured cap.
    pub fn calculate_cancellation_fee(
        &self,
        order_value: f64,
        cancelled_by: CancelledBy,
        minutes_since_order: f64,
    ) -> f64 {
        cancellation::cancellation_fee(order_value, cancelled_by, minutes_since_order, &self.config)
    }

    /// Closest eligible candidate with at least the minimum rating.
    pub fn find_nearest_pusher<'a>(
        &self,
        pickup_lat: f64,
        pickup_lng: f64,
        candidates: &'a [WorkerCandidate],
    ) -> Option<&'a WorkerCandidate> {
        self.find_nearest_pusher_with_distance(pickup_lat, pickup_lng, candidates)
            .map(|(candidate, _)| candidate)
    }

    pub fn find_nearest_pusher_with_distance<'a>(
        &self,
        pickup_lat: f64,
        pickup_lng: f64,
        candidates: &'a [WorkerCandidate],
    ) -> Option<(&'a WorkerCandidate, f64)> {
        matching::nearest_candidate(pickup_lat, pickup_lng, candidates, &self.config)
    }

    pub fn is_peak_hour(&self, hour: u32) -> bool {
        peak::is_peak_hour(hour, &self.config)
    }

    pub fn is_peak_hours(&self, clock: &dyn Clock) -> bool {
        self.is_peak_hour(peak::hour_of(clock))
    }

    pub fn apply_peak_pricing(&self, base_price: f64, clock: &dyn Clock) -> f64 {
        peak::peak_adjusted(base_price, self.is_peak_hours(clock), &self.config)
    }
}

/// Round to the nearest whole unit, halves rounding toward positive infinity
/// (`2.5 -> 3`, `-2.5 -> -2`).
///
/// `f64::round` is exact for non-negative input; only negative halves need
/// the upward adjustment.
pub(crate) fn round_half_up(value: f64) -> f64 {
    let rounded = value.round();
    if value < 0.0 && rounded - value == -0.5 {
        rounded + 1.0
    } else {
        rounded
    }
}

pub(crate) fn round_to_places(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    round_half_up(value * scale) / scale
}
