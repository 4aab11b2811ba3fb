// HTTP client for the external odds feed (The Odds API v4 shape).
//
// Runs in unconfigured mode when no API key is set; the catalog then serves
// the seed fallback. Feed failures are logged and recovered locally, never
// surfaced to wagering callers.

use super::{Market, Selection};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Default timeout for odds feed calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub enum ProviderError {
    /// No API key / endpoint configured
    NotConfigured,
    /// HTTP request failed or timed out
    RequestFailed(String),
    /// Response body did not parse
    InvalidResponse(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::NotConfigured => write!(f, "provider not configured"),
            ProviderError::RequestFailed(msg) => write!(f, "request failed: {}", msg),
            ProviderError::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

// ============================================================================
// FEED RESPONSE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiEvent {
    pub id: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<ApiBookmaker>,
}

#[derive(Debug, Deserialize)]
pub struct ApiBookmaker {
    #[serde(default)]
    pub markets: Vec<ApiMarket>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<ApiOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOutcome {
    pub name: String,
    /// American odds; the feed sends numbers, not always integral
    pub price: f64,
    #[serde(default)]
    pub point: Option<f64>,
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct OddsApiClient {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl OddsApiClient {
    pub fn new(api_key: Option<String>, base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            api_key,
            base_url,
            client,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch and transform one sport's events into markets.
    pub async fn fetch_sport(
        &self,
        sport: &str,
        sport_key: &str,
    ) -> Result<Vec<Market>, ProviderError> {
        let api_key = self.api_key.as_ref().ok_or(ProviderError::NotConfigured)?;

        let url = format!(
            "{}/sports/{}/odds/?apiKey={}&regions=us&markets=h2h,spreads,totals&oddsFormat=american",
            self.base_url, sport_key, api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "odds feed returned {}",
                response.status()
            )));
        }

        let events: Vec<ApiEvent> = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(events
            .iter()
            .filter_map(|e| transform_event(e, sport))
            .collect())
    }
}

/// Transform a feed event into our market shape. Events the feed returns
/// without a prices source (no bookmaker) are discarded.
pub fn transform_event(event: &ApiEvent, sport: &str) -> Option<Market> {
    let bookmaker = event.bookmakers.first()?;

    let mut selections = Vec::new();
    for market in &bookmaker.markets {
        match market.key.as_str() {
            "h2h" => {
                for outcome in &market.outcomes {
                    selections.push(Selection {
                        id: format!("{}-h2h-{}", event.id, slug(&outcome.name)),
                        name: format!("{} ML", outcome.name),
                        odds: outcome.price.round() as i32,
                    });
                }
            }
            "spreads" => {
                for outcome in &market.outcomes {
                    let point = outcome.point.unwrap_or(0.0);
                    let sign = if point >= 0.0 { "+" } else { "" };
                    selections.push(Selection {
                        id: format!("{}-spread-{}", event.id, slug(&outcome.name)),
                        name: format!("{} {}{}", outcome.name, sign, point),
                        odds: outcome.price.round() as i32,
                    });
                }
            }
            "totals" => {
                for outcome in &market.outcomes {
                    let point = outcome.point.unwrap_or(0.0);
                    selections.push(Selection {
                        id: format!("{}-total-{}", event.id, outcome.name.to_lowercase()),
                        name: format!("{} {}", outcome.name, point),
                        odds: outcome.price.round() as i32,
                    });
                }
            }
            _ => {}
        }
    }

    Some(Market {
        id: event.id.clone(),
        sport: sport.to_string(),
        event: format!("{} vs {}", event.away_team, event.home_team),
        home_team: event.home_team.clone(),
        away_team: event.away_team.clone(),
        start_time: event.commence_time,
        close_time: event.commence_time,
        selections,
    })
}

fn slug(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}
