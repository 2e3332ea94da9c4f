//! Pricing, eligibility, matching and order-status rules for the Pushr delivery marketplace.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod telemetry;
