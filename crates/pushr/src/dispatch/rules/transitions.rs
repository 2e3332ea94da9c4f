use super::super::domain::OrderStatus;

/// Legal next statuses for each order status. Terminal statuses map to nothing.
pub fn allowed_transitions(current: OrderStatus) -> &'static [OrderStatus] {
    match current {
        OrderStatus::Pending => &[OrderStatus::Accepted, OrderStatus::Cancelled],
        OrderStatus::Accepted => &[OrderStatus::Pickup, OrderStatus::Cancelled],
        OrderStatus::Pickup => &[OrderStatus::Enroute, OrderStatus::Cancelled],
        OrderStatus::Enroute => &[OrderStatus::Delivered, OrderStatus::Cancelled],
        OrderStatus::Delivered | OrderStatus::Cancelled => &[],
    }
}

pub fn can_transition_status(current: OrderStatus, next: OrderStatus) -> bool {
    allowed_transitions(current).contains(&next)
}

/// String-facing variant of [`can_transition_status`]; unrecognized labels reject.
pub fn can_transition_labels(current: &str, next: &str) -> bool {
    match (current.parse::<OrderStatus>(), next.parse::<OrderStatus>()) {
        (Ok(current), Ok(next)) => can_transition_status(current, next),
        _ => false,
    }
}
