//! Category suggestions from a generative model endpoint.
//!
//! The advisor is optional. Missing credentials, transport failures and
//! malformed payloads all resolve to a fixed bike recommendation so callers
//! always receive a usable answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::DeliveryCategory;
use crate::config::SuggestionConfig;

/// Reasoning attached to every fallback suggestion.
pub const FALLBACK_REASONING: &str =
    "Bike delivery is a reliable default that balances speed and cost for most items.";
/// Estimate used when no suggestion endpoint is configured.
pub const FALLBACK_PRICE_UNCONFIGURED: f64 = 45.0;
/// Estimate used when a configured endpoint could not produce an answer.
pub const FALLBACK_PRICE_UNAVAILABLE: f64 = 50.0;

/// Item description and trip length submitted for a category recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub description: String,
    pub distance_km: f64,
}

/// Recommended category with an indicative price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    #[serde(alias = "recommendedCategory")]
    pub recommended_category: DeliveryCategory,
    #[serde(alias = "estimatedPrice")]
    pub estimated_price: f64,
    pub reasoning: String,
    #[serde(default)]
    pub fallback: bool,
}

impl CategorySuggestion {
    pub fn fallback_for(error: &SuggestionError) -> Self {
        let estimated_price = match error {
            SuggestionError::MissingCredentials => FALLBACK_PRICE_UNCONFIGURED,
            _ => FALLBACK_PRICE_UNAVAILABLE,
        };

        Self {
            recommended_category: DeliveryCategory::Bike,
            estimated_price,
            reasoning: FALLBACK_REASONING.to_string(),
            fallback: true,
        }
    }

    fn validate(self) -> Result<Self, SuggestionError> {
        if !self.estimated_price.is_finite() || self.estimated_price < 0.0 {
            return Err(SuggestionError::Malformed(format!(
                "estimated price {} is not a non-negative amount",
                self.estimated_price
            )));
        }
        if self.reasoning.trim().is_empty() {
            return Err(SuggestionError::Malformed("empty reasoning".to_string()));
        }
        Ok(Self {
            fallback: false,
            ..self
        })
    }
}

/// Errors raised while talking to the suggestion endpoint.
#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    #[error("suggestion endpoint credentials are not configured")]
    MissingCredentials,
    #[error("suggestion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("suggestion endpoint returned HTTP {0}")]
    Status(u16),
    #[error("suggestion payload malformed: {0}")]
    Malformed(String),
}

/// Outbound seam for category recommendations.
#[async_trait]
pub trait CategoryAdvisor: Send + Sync {
    async fn suggest(
        &self,
        request: &SuggestionRequest,
    ) -> Result<CategorySuggestion, SuggestionError>;
}

/// Resolve a suggestion, substituting the fallback for any failure.
pub async fn suggest_category(
    advisor: Option<&dyn CategoryAdvisor>,
    request: &SuggestionRequest,
) -> CategorySuggestion {
    let Some(advisor) = advisor else {
        return CategorySuggestion::fallback_for(&SuggestionError::MissingCredentials);
    };

    match advisor.suggest(request).await.and_then(CategorySuggestion::validate) {
        Ok(suggestion) => suggestion,
        Err(error) => {
            warn!(%error, "category suggestion unavailable, using fallback");
            CategorySuggestion::fallback_for(&error)
        }
    }
}

/// JSON-over-HTTP advisor authenticated with a bearer key.
#[derive(Debug, Clone)]
pub struct HttpCategoryAdvisor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpCategoryAdvisor {
    /// Build an advisor when both endpoint and key are configured.
    pub fn from_config(config: &SuggestionConfig) -> Result<Option<Self>, SuggestionError> {
        let (Some(endpoint), Some(api_key)) = (&config.endpoint, &config.api_key) else {
            return Ok(None);
        };

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Some(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.clone(),
        }))
    }
}

#[async_trait]
impl CategoryAdvisor for HttpCategoryAdvisor {
    async fn suggest(
        &self,
        request: &SuggestionRequest,
    ) -> Result<CategorySuggestion, SuggestionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SuggestionError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str::<CategorySuggestion>(&body)
            .map_err(|err| SuggestionError::Malformed(err.to_string()))
    }
}
