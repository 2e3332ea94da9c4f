use super::super::domain::CancelledBy;
use super::config::RulesConfig;
use super::round_half_up;

pub(crate) fn cancellation_fee(
    order_value: f64,
    cancelled_by: CancelledBy,
    minutes_since_order: f64,
    config: &RulesConfig,
) -> f64 {
    if cancelled_by == CancelledBy::System
        || minutes_since_order < config.cancellation_grace_minutes
    {
        return 0.0;
    }

    // Pusher-initiated cancellations never charge the customer.
    if cancelled_by == CancelledBy::Pusher {
        return 0.0;
    }

    let fee = round_half_up(order_value * config.cancellation_fee_rate);
    fee.min(order_value * config.cancellation_fee_cap_rate)
}
