use crate::infra::{
    demo_roster, parse_category, parse_hour, today_at_hour, InMemoryOrderRepository,
    InMemoryPusherDirectory,
};
use chrono::NaiveDateTime;
use clap::Args;
use pushr::dispatch::{
    can_transition_status, suggest_category, CancelledBy, Clock, CustomerId, DeliveryCategory,
    DispatchRules, DispatchService, FixedClock, GeoPoint, OrderRequest, OrderStatus,
    QuoteRequest, RulesConfig, SuggestionRequest, SystemClock,
};
use pushr::error::AppError;
use std::sync::{Arc, Mutex};

const DEMO_PICKUP: GeoPoint = GeoPoint {
    lat: -26.2041,
    lng: 28.0473,
};
const DEMO_DROPOFF: GeoPoint = GeoPoint {
    lat: -26.1952,
    lng: 28.0340,
};

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Base price before peak adjustment and service fee
    #[arg(long)]
    pub(crate) base_price: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) pickup_lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) pickup_lng: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) dropoff_lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) dropoff_lng: f64,
    /// walking, wheelbarrow, bike or truck
    #[arg(long, value_parser = parse_category)]
    pub(crate) category: DeliveryCategory,
    /// Quote as if it were this hour today (0-23). Defaults to the local time.
    #[arg(long, value_parser = parse_hour)]
    pub(crate) hour: Option<u32>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Start the walkthrough at this hour today (0-23). Defaults to the local time.
    #[arg(long, value_parser = parse_hour)]
    pub(crate) hour: Option<u32>,
    /// Skip the cancellation portion of the demo.
    #[arg(long)]
    pub(crate) skip_cancellation: bool,
}

/// Clock the walkthrough moves forward between lifecycle steps.
struct DemoClock {
    now: Mutex<NaiveDateTime>,
}

impl DemoClock {
    fn starting_at(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    fn advance_minutes(&self, minutes: i64) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += chrono::Duration::minutes(minutes);
        }
    }
}

impl Clock for DemoClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

fn starting_time(hour: Option<u32>) -> Result<NaiveDateTime, AppError> {
    match hour {
        Some(hour) => today_at_hour(hour).map_err(AppError::Input),
        None => Ok(SystemClock.now()),
    }
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    if !args.base_price.is_finite() || args.base_price < 0.0 {
        return Err(AppError::Input(format!(
            "base price must be a non-negative amount (found {})",
            args.base_price
        )));
    }

    let clock = FixedClock::new(starting_time(args.hour)?);
    let rules = DispatchRules::default();
    let quote = rules.quote(
        &QuoteRequest {
            base_price: args.base_price,
            pickup: GeoPoint::new(args.pickup_lat, args.pickup_lng),
            dropoff: GeoPoint::new(args.dropoff_lat, args.dropoff_lng),
            category: args.category,
        },
        &clock,
    );

    let breakdown = &quote.breakdown;
    println!(
        "Quote for a {} delivery over {} km (quoted {})",
        breakdown.category,
        breakdown.distance,
        quote.quoted_at.format("%Y-%m-%d %H:%M")
    );
    if quote.peak_applied {
        println!(
            "- Peak pricing applied: {} -> {}",
            quote.requested_base_price, breakdown.base_price
        );
    } else {
        println!("- Base price: {}", breakdown.base_price);
    }
    println!("- Service fee: {}", breakdown.service_fee);
    println!("- Customer pays: {}", breakdown.total);
    println!(
        "- Split: platform {} | pusher {}",
        breakdown.platform_fee, breakdown.pusher_earning
    );

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        hour,
        skip_cancellation,
    } = args;

    let clock = Arc::new(DemoClock::starting_at(starting_time(hour)?));
    let pushers = Arc::new(InMemoryPusherDirectory::with_roster(demo_roster()));
    let service = DispatchService::with_clock(
        Arc::new(InMemoryOrderRepository::default()),
        pushers.clone(),
        RulesConfig::default(),
        clock.clone(),
    );

    println!("Pushr dispatch demo");
    println!("Roster:");
    for pusher in pushers.roster() {
        let eligibility = service.rules().can_pusher_accept_job(
            pusher.float_balance,
            pusher.is_online,
            pusher.active_deliveries,
        );
        let note = eligibility
            .reason
            .unwrap_or_else(|| format!("eligible, rating {}", pusher.rating));
        println!("  - {}: {}", pusher.id.0, note);
    }

    let suggestion = suggest_category(
        None,
        &SuggestionRequest {
            description: "Two boxes of groceries".to_string(),
            distance_km: 1.7,
        },
    )
    .await;
    println!(
        "\nSuggested category: {} (est. {}) - {}",
        suggestion.recommended_category, suggestion.estimated_price, suggestion.reasoning
    );

    let order = service.create_order(OrderRequest {
        customer_id: CustomerId("cust-amara".to_string()),
        has_pending_payment: false,
        category: suggestion.recommended_category,
        base_price: 40.0,
        pickup: DEMO_PICKUP,
        dropoff: DEMO_DROPOFF,
    })?;
    println!(
        "\nOrder {} created at {}: total {} (peak applied: {})",
        order.order_id.0,
        order.created_at.format("%H:%M"),
        order.pricing.total,
        order.peak_applied
    );
    println!(
        "  Matched {} {} km from pickup",
        order.assigned_pusher.0, order.pickup_distance_km
    );

    for status in [
        OrderStatus::Accepted,
        OrderStatus::Pickup,
        OrderStatus::Enroute,
        OrderStatus::Delivered,
    ] {
        clock.advance_minutes(8);
        let updated = service.advance(&order.order_id, status)?;
        println!(
            "  {} -> {}",
            updated.updated_at.format("%H:%M"),
            updated.status
        );
    }

    println!(
        "  Delivered orders can move back to pickup: {}",
        can_transition_status(OrderStatus::Delivered, OrderStatus::Pickup)
    );

    if !skip_cancellation {
        println!("\nCancellation");
        let second = service.create_order(OrderRequest {
            customer_id: CustomerId("cust-bongani".to_string()),
            has_pending_payment: false,
            category: DeliveryCategory::Wheelbarrow,
            base_price: 60.0,
            pickup: DEMO_PICKUP,
            dropoff: DEMO_DROPOFF,
        })?;
        clock.advance_minutes(2);
        println!(
            "  Free cancellation window: fee would be {}",
            service.rules().calculate_cancellation_fee(
                second.pricing.total,
                CancelledBy::Customer,
                2.0
            )
        );
        clock.advance_minutes(10);
        let cancelled = service.cancel(&second.order_id, CancelledBy::Customer)?;
        if let Some(record) = &cancelled.cancellation {
            println!(
                "  Order {} cancelled by {} after {:.0} min: fee {}",
                cancelled.order_id.0,
                record.cancelled_by.label(),
                record.minutes_since_order,
                record.fee
            );
        }
    }

    let summary = service.earnings(&order.assigned_pusher)?;
    println!("\nEarnings for {}", order.assigned_pusher.0);
    println!(
        "- {} deliveries | total {} | average {} | platform share {}",
        summary.total_deliveries,
        summary.total_earnings,
        summary.average_earning,
        summary.platform_commission
    );
    match serde_json::to_string_pretty(&service.get(&order.order_id)?.status_view()) {
        Ok(json) => println!("  Final status payload:\n{}", json),
        Err(err) => println!("  Final status payload unavailable: {}", err),
    }

    Ok(())
}
