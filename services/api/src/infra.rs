use chrono::{Local, NaiveDateTime};
use metrics_exporter_prometheus::PrometheusHandle;
use pushr::dispatch::{
    CustomerId, DeliveryCategory, DeliveryEarning, DeliveryOrder, OrderId, OrderRepository,
    PusherDirectory, PusherId, RepositoryError, WorkerCandidate,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryOrderRepository {
    orders: Arc<Mutex<HashMap<OrderId, DeliveryOrder>>>,
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, order: DeliveryOrder) -> Result<DeliveryOrder, RepositoryError> {
        let mut guard = self.orders.lock().expect("repository mutex poisoned");
        if guard.contains_key(&order.order_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(order.order_id.clone(), order.clone());
        Ok(order)
    }

    fn update(&self, order: DeliveryOrder) -> Result<(), RepositoryError> {
        let mut guard = self.orders.lock().expect("repository mutex poisoned");
        if guard.contains_key(&order.order_id) {
            guard.insert(order.order_id.clone(), order);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &OrderId) -> Result<Option<DeliveryOrder>, RepositoryError> {
        let guard = self.orders.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn has_active_order(&self, customer: &CustomerId) -> Result<bool, RepositoryError> {
        let guard = self.orders.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .any(|order| &order.customer_id == customer && !order.status.is_terminal()))
    }
}

/// Courier roster kept in process memory, with one earnings ledger per pusher.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPusherDirectory {
    roster: Arc<Mutex<Vec<WorkerCandidate>>>,
    ledgers: Arc<Mutex<HashMap<PusherId, Vec<DeliveryEarning>>>>,
}

impl InMemoryPusherDirectory {
    pub(crate) fn with_roster(roster: Vec<WorkerCandidate>) -> Self {
        Self {
            roster: Arc::new(Mutex::new(roster)),
            ledgers: Arc::default(),
        }
    }

    pub(crate) fn roster(&self) -> Vec<WorkerCandidate> {
        self.roster.lock().expect("roster mutex poisoned").clone()
    }

    fn adjust(
        &self,
        id: &PusherId,
        apply: impl FnOnce(&mut WorkerCandidate),
    ) -> Result<(), RepositoryError> {
        let mut guard = self.roster.lock().expect("roster mutex poisoned");
        let candidate = guard
            .iter_mut()
            .find(|candidate| &candidate.id == id)
            .ok_or(RepositoryError::NotFound)?;
        apply(candidate);
        Ok(())
    }
}

impl PusherDirectory for InMemoryPusherDirectory {
    fn candidates(&self) -> Result<Vec<WorkerCandidate>, RepositoryError> {
        Ok(self.roster())
    }

    fn fetch(&self, id: &PusherId) -> Result<Option<WorkerCandidate>, RepositoryError> {
        let guard = self.roster.lock().expect("roster mutex poisoned");
        Ok(guard.iter().find(|candidate| &candidate.id == id).cloned())
    }

    fn record_assignment(&self, id: &PusherId) -> Result<(), RepositoryError> {
        self.adjust(id, |candidate| candidate.active_deliveries += 1)
    }

    fn record_release(&self, id: &PusherId) -> Result<(), RepositoryError> {
        self.adjust(id, |candidate| {
            candidate.active_deliveries = candidate.active_deliveries.saturating_sub(1)
        })
    }

    fn record_delivery(
        &self,
        id: &PusherId,
        earning: DeliveryEarning,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.ledgers.lock().expect("ledger mutex poisoned");
        guard.entry(id.clone()).or_default().push(earning);
        Ok(())
    }

    fn ledger(&self, id: &PusherId) -> Result<Vec<DeliveryEarning>, RepositoryError> {
        let guard = self.ledgers.lock().expect("ledger mutex poisoned");
        Ok(guard.get(id).cloned().unwrap_or_default())
    }
}

/// Johannesburg CBD roster used by `serve` and `demo`.
pub(crate) fn demo_roster() -> Vec<WorkerCandidate> {
    let pusher = |id: &str, lat, lng, float_balance, is_online, active_deliveries, rating| {
        WorkerCandidate {
            id: PusherId(id.to_string()),
            lat,
            lng,
            float_balance,
            is_online,
            active_deliveries,
            rating,
        }
    };

    vec![
        pusher("pusher-thabo", -26.2100, 28.0400, 120.0, true, 0, 4.8),
        pusher("pusher-lerato", -26.2050, 28.0480, 35.0, true, 1, 4.6),
        pusher("pusher-sipho", -26.2045, 28.0470, 0.0, true, 0, 4.9),
        pusher("pusher-naledi", -26.2000, 28.0450, 80.0, false, 0, 4.7),
        pusher("pusher-kagiso", -26.2060, 28.0500, 60.0, true, 0, 3.6),
        pusher("pusher-ayanda", -26.1900, 28.0300, 200.0, true, 2, 4.5),
    ]
}

pub(crate) fn parse_category(raw: &str) -> Result<DeliveryCategory, String> {
    raw.parse::<DeliveryCategory>().map_err(|err| {
        format!("{err}; expected one of walking, wheelbarrow, bike, truck")
    })
}

pub(crate) fn parse_hour(raw: &str) -> Result<u32, String> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|hour| *hour < 24)
        .ok_or_else(|| format!("failed to parse '{raw}' as an hour between 0 and 23"))
}

/// Today's local date at `hour:00`.
pub(crate) fn today_at_hour(hour: u32) -> Result<NaiveDateTime, String> {
    Local::now()
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .ok_or_else(|| format!("hour {hour} is outside the day"))
}
