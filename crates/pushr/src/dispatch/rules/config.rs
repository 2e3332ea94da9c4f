use serde::{Deserialize, Serialize};

/// Inclusive range of local wall-clock hours that attract the peak multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl PeakWindow {
    pub fn contains(&self, hour: u32) -> bool {
        (self.start_hour..=self.end_hour).contains(&hour)
    }
}

/// Commission, eligibility and pricing dials applied by the dispatch rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    pub platform_commission_rate: f64,
    pub pusher_earning_rate: f64,
    pub service_fee: f64,
    pub cancellation_fee_rate: f64,
    pub cancellation_fee_cap_rate: f64,
    pub cancellation_grace_minutes: f64,
    pub minimum_float: f64,
    pub max_active_deliveries: u32,
    pub minimum_rating: f64,
    pub peak_multiplier: f64,
    pub peak_windows: Vec<PeakWindow>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            platform_commission_rate: 0.15,
            pusher_earning_rate: 0.85,
            service_fee: 5.0,
            cancellation_fee_rate: 0.20,
            cancellation_fee_cap_rate: 0.5,
            cancellation_grace_minutes: 5.0,
            minimum_float: 1.0,
            max_active_deliveries: 3,
            minimum_rating: 4.0,
            peak_multiplier: 1.2,
            peak_windows: vec![
                PeakWindow {
                    start_hour: 7,
                    end_hour: 9,
                },
                PeakWindow {
                    start_hour: 17,
                    end_hour: 19,
                },
            ],
        }
    }
}
