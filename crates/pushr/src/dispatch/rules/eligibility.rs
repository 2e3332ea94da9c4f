use super::super::domain::{CustomerRejection, PusherRejection};
use super::config::RulesConfig;

// Checks run in priority order; the first failure is reported.
pub(crate) fn check_pusher(
    float_balance: f64,
    is_online: bool,
    active_deliveries: u32,
    config: &RulesConfig,
) -> Result<(), PusherRejection> {
    if !is_online {
        return Err(PusherRejection::Offline);
    }

    if float_balance < config.minimum_float {
        return Err(PusherRejection::InsufficientFloat {
            minimum: config.minimum_float,
        });
    }

    if active_deliveries >= config.max_active_deliveries {
        return Err(PusherRejection::ActiveDeliveryLimit {
            maximum: config.max_active_deliveries,
        });
    }

    Ok(())
}

pub(crate) fn check_customer(
    has_pending_payment: bool,
    has_active_delivery: bool,
) -> Result<(), CustomerRejection> {
    if has_pending_payment {
        return Err(CustomerRejection::PendingPayment);
    }

    if has_active_delivery {
        return Err(CustomerRejection::ActiveDelivery);
    }

    Ok(())
}
