use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::dispatch::domain::{
    CustomerId, DeliveryCategory, DeliveryEarning, GeoPoint, OrderId, PusherId, WorkerCandidate,
};
use crate::dispatch::repository::{
    DeliveryOrder, OrderRepository, PusherDirectory, RepositoryError,
};
use crate::dispatch::rules::{Clock, DispatchRules, RulesConfig};
use crate::dispatch::service::{DispatchService, OrderRequest};

pub(super) const PICKUP: GeoPoint = GeoPoint {
    lat: -26.2041,
    lng: 28.0473,
};

pub(super) const DROPOFF: GeoPoint = GeoPoint {
    lat: -26.1952,
    lng: 28.0340,
};

pub(super) fn rules() -> DispatchRules {
    DispatchRules::new(RulesConfig::default())
}

pub(super) fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 14)
        .expect("valid date")
        .and_hms_opt(hour, minute, 0)
        .expect("valid time")
}

/// Clock the tests can move forward between service calls.
#[derive(Clone)]
pub(super) struct SteppingClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl SteppingClock {
    pub(super) fn starting_at(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub(super) fn advance_minutes(&self, minutes: i64) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard += chrono::Duration::minutes(minutes);
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

/// Candidate `km_north` kilometres north of the pickup point (roughly).
pub(super) fn candidate(id: &str, km_north: f64) -> WorkerCandidate {
    WorkerCandidate {
        id: PusherId(id.to_string()),
        lat: PICKUP.lat + km_north / 111.195,
        lng: PICKUP.lng,
        float_balance: 50.0,
        is_online: true,
        active_deliveries: 0,
        rating: 4.6,
    }
}

pub(super) fn order_request(customer: &str) -> OrderRequest {
    OrderRequest {
        customer_id: CustomerId(customer.to_string()),
        has_pending_payment: false,
        category: DeliveryCategory::Bike,
        base_price: 40.0,
        pickup: PICKUP,
        dropoff: DROPOFF,
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    orders: Mutex<HashMap<OrderId, DeliveryOrder>>,
}

impl OrderRepository for MemoryRepository {
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
        match guard.get_mut(&order.order_id) {
            Some(existing) => {
                *existing = order;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
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

/// Repository that can stall reads and drop a single write.
#[derive(Default)]
pub(super) struct StallingRepository {
    inner: MemoryRepository,
    fetch_delay: Option<Duration>,
    reject_next_update: AtomicBool,
}

impl StallingRepository {
    pub(super) fn with_fetch_delay(delay: Duration) -> Self {
        Self {
            fetch_delay: Some(delay),
            ..Self::default()
        }
    }

    pub(super) fn reject_next_update(&self) {
        self.reject_next_update.store(true, Ordering::SeqCst);
    }
}

impl OrderRepository for StallingRepository {
    fn insert(&self, order: DeliveryOrder) -> Result<DeliveryOrder, RepositoryError> {
        self.inner.insert(order)
    }

    fn update(&self, order: DeliveryOrder) -> Result<(), RepositoryError> {
        if self.reject_next_update.swap(false, Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("write dropped".to_string()));
        }
        self.inner.update(order)
    }

    fn fetch(&self, id: &OrderId) -> Result<Option<DeliveryOrder>, RepositoryError> {
        if let Some(delay) = self.fetch_delay {
            thread::sleep(delay);
        }
        self.inner.fetch(id)
    }

    fn has_active_order(&self, customer: &CustomerId) -> Result<bool, RepositoryError> {
        if let Some(delay) = self.fetch_delay {
            thread::sleep(delay);
        }
        self.inner.has_active_order(customer)
    }
}

pub(super) struct UnavailableRepository;

impl OrderRepository for UnavailableRepository {
    fn insert(&self, _order: DeliveryOrder) -> Result<DeliveryOrder, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn update(&self, _order: DeliveryOrder) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn fetch(&self, _id: &OrderId) -> Result<Option<DeliveryOrder>, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn has_active_order(&self, _customer: &CustomerId) -> Result<bool, RepositoryError> {
        Ok(false)
    }
}

#[derive(Default)]
pub(super) struct MemoryPushers {
    roster: Mutex<Vec<WorkerCandidate>>,
    ledgers: Mutex<HashMap<PusherId, Vec<DeliveryEarning>>>,
    assignments_refused: AtomicBool,
}

impl MemoryPushers {
    pub(super) fn with(candidates: Vec<WorkerCandidate>) -> Self {
        Self {
            roster: Mutex::new(candidates),
            ledgers: Mutex::default(),
            assignments_refused: AtomicBool::new(false),
        }
    }

    pub(super) fn active_deliveries(&self, id: &str) -> u32 {
        let guard = self.roster.lock().expect("roster mutex poisoned");
        guard
            .iter()
            .find(|candidate| candidate.id.0 == id)
            .map(|candidate| candidate.active_deliveries)
            .unwrap_or_default()
    }

    pub(super) fn refuse_assignments(&self) {
        self.assignments_refused.store(true, Ordering::SeqCst);
    }

    pub(super) fn ledger_len(&self, id: &str) -> usize {
        let guard = self.ledgers.lock().expect("ledger mutex poisoned");
        guard
            .get(&PusherId(id.to_string()))
            .map(Vec::len)
            .unwrap_or_default()
    }

    pub(super) fn set_online(&self, id: &str, online: bool) {
        let mut guard = self.roster.lock().expect("roster mutex poisoned");
        if let Some(candidate) = guard.iter_mut().find(|candidate| candidate.id.0 == id) {
            candidate.is_online = online;
        }
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

impl PusherDirectory for MemoryPushers {
    fn candidates(&self) -> Result<Vec<WorkerCandidate>, RepositoryError> {
        Ok(self.roster.lock().expect("roster mutex poisoned").clone())
    }

    fn fetch(&self, id: &PusherId) -> Result<Option<WorkerCandidate>, RepositoryError> {
        let guard = self.roster.lock().expect("roster mutex poisoned");
        Ok(guard.iter().find(|candidate| &candidate.id == id).cloned())
    }

    fn record_assignment(&self, id: &PusherId) -> Result<(), RepositoryError> {
        if self.assignments_refused.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("roster locked".to_string()));
        }
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

pub(super) fn service_with(
    pushers: Vec<WorkerCandidate>,
    clock: SteppingClock,
) -> (
    Arc<DispatchService<MemoryRepository, MemoryPushers>>,
    Arc<MemoryPushers>,
) {
    service_over(Arc::new(MemoryRepository::default()), pushers, clock)
}

pub(super) fn service_over<R: OrderRepository + 'static>(
    repository: Arc<R>,
    pushers: Vec<WorkerCandidate>,
    clock: SteppingClock,
) -> (Arc<DispatchService<R, MemoryPushers>>, Arc<MemoryPushers>) {
    let directory = Arc::new(MemoryPushers::with(pushers));
    let service = Arc::new(DispatchService::with_clock(
        repository,
        directory.clone(),
        RulesConfig::default(),
        Arc::new(clock),
    ));
    (service, directory)
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is json")
}
