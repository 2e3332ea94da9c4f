//! Delivery pricing, eligibility, matching and order lifecycle for the Pushr marketplace.
//!
//! `rules` holds the pure calculations. `service`, `repository` and `router`
//! compose them into an in-memory order board, and `suggestion` wraps the
//! optional category-recommendation endpoint.

pub mod domain;
mod quote;
pub mod repository;
pub mod router;
pub mod rules;
pub mod service;
pub mod suggestion;

#[cfg(test)]
mod tests;

pub use domain::{
    CancellationRecord, CancelledBy, CustomerEligibility, CustomerId, CustomerRejection,
    DeliveryCategory, DeliveryEarning, EarningsSummary, GeoPoint, OrderId, OrderStatus,
    PricingBreakdown, PusherEligibility, PusherId, PusherRejection, UnknownLabel,
    WorkerCandidate,
};
pub use quote::{DeliveryQuote, QuoteRequest};
pub use repository::{
    DeliveryOrder, OrderRepository, OrderStatusView, PusherDirectory, RepositoryError,
};
pub use router::{dispatch_router, suggestion_router};
pub use rules::{
    allowed_transitions, calculate_distance, calculate_pusher_earnings, can_transition_labels,
    can_transition_status, Clock, DispatchRules, FixedClock, PeakWindow, RulesConfig,
    SystemClock,
};
pub use service::{DispatchService, OrderRequest, OrderServiceError};
pub use suggestion::{
    suggest_category, CategoryAdvisor, CategorySuggestion, HttpCategoryAdvisor,
    SuggestionError, SuggestionRequest,
};
