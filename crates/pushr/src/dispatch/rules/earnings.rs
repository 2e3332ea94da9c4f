use super::super::domain::{DeliveryEarning, EarningsSummary};
use super::round_to_places;

/// Sum a pusher's completed deliveries.
///
/// `commission` on each record is treated as the pusher's take-home amount and
/// `price - commission` as the platform's share. An empty ledger averages to zero.
pub fn calculate_pusher_earnings(deliveries: &[DeliveryEarning]) -> EarningsSummary {
    let total_earnings: f64 = deliveries.iter().map(|delivery| delivery.commission).sum();
    let platform_commission: f64 = deliveries
        .iter()
        .map(|delivery| delivery.price - delivery.commission)
        .sum();
    let total_deliveries = deliveries.len();

    let average_earning = if total_deliveries == 0 {
        0.0
    } else {
        round_to_places(total_earnings / total_deliveries as f64, 2)
    };

    EarningsSummary {
        total_earnings,
        total_deliveries,
        average_earning,
        platform_commission,
    }
}
