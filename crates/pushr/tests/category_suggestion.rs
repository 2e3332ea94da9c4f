use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pushr::config::SuggestionConfig;
use pushr::dispatch::suggestion::{FALLBACK_PRICE_UNAVAILABLE, FALLBACK_REASONING};
use pushr::dispatch::{
    suggest_category, CategoryAdvisor, CategorySuggestion, DeliveryCategory,
    HttpCategoryAdvisor, SuggestionError, SuggestionRequest,
};

struct ScriptedAdvisor {
    reply: fn() -> Result<CategorySuggestion, SuggestionError>,
    calls: AtomicUsize,
}

impl ScriptedAdvisor {
    fn new(reply: fn() -> Result<CategorySuggestion, SuggestionError>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CategoryAdvisor for ScriptedAdvisor {
    async fn suggest(
        &self,
        _request: &SuggestionRequest,
    ) -> Result<CategorySuggestion, SuggestionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.reply)()
    }
}

fn fridge() -> SuggestionRequest {
    SuggestionRequest {
        description: "Double-door fridge".to_string(),
        distance_km: 8.4,
    }
}

#[tokio::test]
async fn live_answer_is_passed_through() {
    let advisor = ScriptedAdvisor::new(|| {
        Ok(CategorySuggestion {
            recommended_category: DeliveryCategory::Truck,
            estimated_price: 180.0,
            reasoning: "Large appliance needs a truck.".to_string(),
            fallback: true,
        })
    });

    let suggestion = suggest_category(Some(&advisor), &fridge()).await;

    assert_eq!(advisor.calls.load(Ordering::SeqCst), 1);
    assert_eq!(suggestion.recommended_category, DeliveryCategory::Truck);
    assert_eq!(suggestion.estimated_price, 180.0);
    assert!(!suggestion.fallback);
}

#[tokio::test]
async fn unreachable_endpoint_degrades_to_fallback() {
    let config = SuggestionConfig {
        endpoint: Some("http://127.0.0.1:9/suggest".to_string()),
        api_key: Some("test-key".to_string()),
        timeout: Duration::from_secs(2),
    };
    let advisor = HttpCategoryAdvisor::from_config(&config)
        .expect("client builds")
        .expect("credentials configured");

    let suggestion = suggest_category(Some(&advisor), &fridge()).await;

    assert!(suggestion.fallback);
    assert_eq!(suggestion.recommended_category, DeliveryCategory::Bike);
    assert_eq!(suggestion.estimated_price, FALLBACK_PRICE_UNAVAILABLE);
    assert_eq!(suggestion.reasoning, FALLBACK_REASONING);
}

#[tokio::test]
async fn advisor_is_consulted_once_per_request() {
    let advisor = ScriptedAdvisor::new(|| Err(SuggestionError::Malformed("empty".to_string())));

    for _ in 0..3 {
        let suggestion = suggest_category(Some(&advisor), &fridge()).await;
        assert!(suggestion.fallback);
    }
    assert_eq!(advisor.calls.load(Ordering::SeqCst), 3);
}
