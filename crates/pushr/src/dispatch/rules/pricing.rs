use super::super::domain::{DeliveryCategory, PricingBreakdown};
use super::config::RulesConfig;
use super::round_half_up;

pub(crate) fn price_delivery(
    base_price: f64,
    distance: f64,
    category: DeliveryCategory,
    config: &RulesConfig,
) -> PricingBreakdown {
    let service_fee = config.service_fee;

    PricingBreakdown {
        base_price,
        distance,
        category,
        service_fee,
        platform_fee: round_half_up(base_price * config.platform_commission_rate),
        pusher_earning: round_half_up(base_price * config.pusher_earning_rate),
        total: base_price + service_fee,
    }
}
