use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{
    CancellationRecord, CancelledBy, CustomerId, CustomerRejection, DeliveryCategory,
    EarningsSummary, GeoPoint, OrderId, OrderStatus, PusherId, PusherRejection,
};
use super::quote::QuoteRequest;
use super::repository::{DeliveryOrder, OrderRepository, PusherDirectory, RepositoryError};
use super::rules::{
    calculate_pusher_earnings, can_transition_status, Clock, DispatchRules, RulesConfig,
    SystemClock,
};

/// Customer request to open a delivery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub has_pending_payment: bool,
    pub category: DeliveryCategory,
    pub base_price: f64,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
}

/// Service composing the rules engine, order repository and pusher directory.
///
/// Every read-check-write sequence on the board runs under `board`, so two
/// requests can never both observe the same order status and act on it.
pub struct DispatchService<R, P> {
    repository: Arc<R>,
    pushers: Arc<P>,
    rules: Arc<DispatchRules>,
    clock: Arc<dyn Clock>,
    board: Mutex<()>,
}

static ORDER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_order_id() -> OrderId {
    let id = ORDER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OrderId(format!("ord-{id:06}"))
}

impl<R, P> DispatchService<R, P>
where
    R: OrderRepository + 'static,
    P: PusherDirectory + 'static,
{
    pub fn new(repository: Arc<R>, pushers: Arc<P>, config: RulesConfig) -> Self {
        Self::with_clock(repository, pushers, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        pushers: Arc<P>,
        config: RulesConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            pushers,
            rules: Arc::new(DispatchRules::new(config)),
            clock,
            board: Mutex::new(()),
        }
    }

    fn lock_board(&self) -> MutexGuard<'_, ()> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn rules(&self) -> &DispatchRules {
        &self.rules
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Price the request, match the nearest eligible pusher and store the order as pending.
    pub fn create_order(&self, request: OrderRequest) -> Result<DeliveryOrder, OrderServiceError> {
        let _board = self.lock_board();
        let has_active_delivery = self.repository.has_active_order(&request.customer_id)?;
        self.rules.check_customer(request.has_pending_payment, has_active_delivery)?;

        let quote = self.rules.quote(
            &QuoteRequest {
                base_price: request.base_price,
                pickup: request.pickup,
                dropoff: request.dropoff,
                category: request.category,
            },
            self.clock.as_ref(),
        );

        let candidates = self.pushers.candidates()?;
        let (pusher, pickup_distance_km) = self
            .rules
            .find_nearest_pusher_with_distance(request.pickup.lat, request.pickup.lng, &candidates)
            .map(|(candidate, distance)| (candidate.id.clone(), distance))
            .ok_or(OrderServiceError::NoPusherAvailable)?;

        let order = DeliveryOrder {
            order_id: next_order_id(),
            customer_id: request.customer_id,
            category: request.category,
            pickup: request.pickup,
            dropoff: request.dropoff,
            pricing: quote.breakdown,
            peak_applied: quote.peak_applied,
            status: OrderStatus::Pending,
            assigned_pusher: pusher,
            pickup_distance_km,
            created_at: quote.quoted_at,
            updated_at: quote.quoted_at,
            cancellation: None,
        };

        let stored = self.repository.insert(order)?;
        info!(
            order_id = %stored.order_id.0,
            pusher_id = %stored.assigned_pusher.0,
            total = stored.pricing.total,
            "delivery order created"
        );
        Ok(stored)
    }

    /// Move an order to `next`, enforcing the status table.
    ///
    /// Acceptance re-checks the assigned pusher's eligibility. Moving to
    /// `cancelled` here is treated as a system cancellation. The order is
    /// stored before the pusher directory is touched; if the directory then
    /// fails, the stored order is restored.
    pub fn advance(
        &self,
        order_id: &OrderId,
        next: OrderStatus,
    ) -> Result<DeliveryOrder, OrderServiceError> {
        let _board = self.lock_board();
        if next == OrderStatus::Cancelled {
            return self.cancel_locked(order_id, CancelledBy::System);
        }

        let previous = self.get(order_id)?;
        ensure_transition(previous.status, next)?;

        if next == OrderStatus::Accepted {
            let pusher = self
                .pushers
                .fetch(&previous.assigned_pusher)?
                .ok_or(RepositoryError::NotFound)?;
            self.rules.check_pusher(
                pusher.float_balance,
                pusher.is_online,
                pusher.active_deliveries,
            )?;
        }

        let mut order = previous.clone();
        order.status = next;
        order.updated_at = self.clock.now();
        self.repository.update(order.clone())?;

        let applied = match next {
            OrderStatus::Accepted => self.pushers.record_assignment(&order.assigned_pusher),
            OrderStatus::Delivered => self.settle_delivery(&order),
            _ => Ok(()),
        };
        if let Err(err) = applied {
            self.restore(previous);
            return Err(err.into());
        }

        debug!(order_id = %order.order_id.0, from = %previous.status, to = %next, "order status advanced");
        Ok(order)
    }

    /// Cancel an order, charging the customer according to who cancelled and when.
    pub fn cancel(
        &self,
        order_id: &OrderId,
        cancelled_by: CancelledBy,
    ) -> Result<DeliveryOrder, OrderServiceError> {
        let _board = self.lock_board();
        self.cancel_locked(order_id, cancelled_by)
    }

    fn cancel_locked(
        &self,
        order_id: &OrderId,
        cancelled_by: CancelledBy,
    ) -> Result<DeliveryOrder, OrderServiceError> {
        let previous = self.get(order_id)?;
        ensure_transition(previous.status, OrderStatus::Cancelled)?;

        let now = self.clock.now();
        let minutes_since_order =
            (now - previous.created_at).num_milliseconds() as f64 / 60_000.0;
        let fee = self.rules.calculate_cancellation_fee(
            previous.pricing.total,
            cancelled_by,
            minutes_since_order,
        );

        let mut order = previous.clone();
        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        order.cancellation = Some(CancellationRecord {
            cancelled_by,
            fee,
            minutes_since_order,
            cancelled_at: now,
        });
        self.repository.update(order.clone())?;

        if previous.status.occupies_pusher() {
            if let Err(err) = self.pushers.record_release(&order.assigned_pusher) {
                self.restore(previous);
                return Err(err.into());
            }
        }

        info!(
            order_id = %order.order_id.0,
            cancelled_by = cancelled_by.label(),
            fee,
            "delivery order cancelled"
        );
        Ok(order)
    }

    // The ledger entry is booked before the slot is freed; once it is booked
    // the order stays delivered even if the release fails.
    fn settle_delivery(&self, order: &DeliveryOrder) -> Result<(), RepositoryError> {
        self.pushers
            .record_delivery(&order.assigned_pusher, order.earning())?;
        if let Err(err) = self.pushers.record_release(&order.assigned_pusher) {
            warn!(
                order_id = %order.order_id.0,
                pusher_id = %order.assigned_pusher.0,
                error = %err,
                "pusher slot not released after delivery"
            );
        }
        Ok(())
    }

    fn restore(&self, previous: DeliveryOrder) {
        let order_id = previous.order_id.clone();
        if let Err(err) = self.repository.update(previous) {
            warn!(order_id = %order_id.0, error = %err, "failed to restore order after pusher update error");
        }
    }

    /// Fetch an order for API responses.
    pub fn get(&self, order_id: &OrderId) -> Result<DeliveryOrder, OrderServiceError> {
        let order = self
            .repository
            .fetch(order_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(order)
    }

    /// Aggregate the pusher's delivered orders.
    pub fn earnings(&self, pusher_id: &PusherId) -> Result<EarningsSummary, OrderServiceError> {
        let ledger = self.pushers.ledger(pusher_id)?;
        Ok(calculate_pusher_earnings(&ledger))
    }
}

fn ensure_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderServiceError> {
    if can_transition_status(from, to) {
        Ok(())
    } else {
        Err(OrderServiceError::IllegalTransition { from, to })
    }
}

/// Error raised by the dispatch service.
#[derive(Debug, thiserror::Error)]
pub enum OrderServiceError {
    #[error(transparent)]
    CustomerIneligible(#[from] CustomerRejection),
    #[error(transparent)]
    PusherIneligible(#[from] PusherRejection),
    #[error("no eligible pusher is available near the pickup location")]
    NoPusherAvailable,
    #[error("order cannot move from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
