// ============================================================================
// Market Catalog - tradeable events and the odds cache
// ============================================================================
//
//   - provider: HTTP client for the external odds feed
//   - seed: static fallback catalog when the feed is unavailable
//
// The catalog owns its own TTL and lock; refresh swaps in a new immutable
// snapshot so concurrent readers never observe a partially replaced list.

pub mod provider;
pub mod seed;

pub use provider::{OddsApiClient, ProviderError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Sports the book carries, mapped to the feed's sport keys.
pub const SUPPORTED_SPORTS: [(&str, &str); 5] = [
    ("nfl", "americanfootball_nfl"),
    ("nba", "basketball_nba"),
    ("mlb", "baseball_mlb"),
    ("nhl", "icehockey_nhl"),
    ("soccer", "soccer_usa_mls"),
];

/// One outcome within a market, priced in American odds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub id: String,
    pub name: String,
    pub odds: i32,
}

/// A tradeable event. Status is derived from the close time, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub sport: String,
    pub event: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: DateTime<Utc>,
    /// Lock time: no new wagers or cancellations afterwards. Set to the
    /// event start time (conservative, no in-play support).
    pub close_time: DateTime<Utc>,
    pub selections: Vec<Selection>,
}

impl Market {
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now < self.close_time
    }

    pub fn status(&self, now: DateTime<Utc>) -> &'static str {
        if self.is_open(now) {
            "open"
        } else {
            "closed"
        }
    }

    pub fn selection(&self, selection_id: &str) -> Option<&Selection> {
        self.selections.iter().find(|s| s.id == selection_id)
    }
}

struct CatalogSnapshot {
    markets: Vec<Market>,
    fetched_at: Option<DateTime<Utc>>,
}

/// TTL cache over the external odds feed with a static seed fallback.
pub struct MarketCatalog {
    client: OddsApiClient,
    ttl: Duration,
    snapshot: RwLock<CatalogSnapshot>,
}

impl MarketCatalog {
    pub fn new(client: OddsApiClient, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            snapshot: RwLock::new(CatalogSnapshot {
                markets: Vec::new(),
                fetched_at: None,
            }),
        }
    }

    /// Build a catalog preloaded with fixed markets and a TTL long enough
    /// that no refresh happens. For tests.
    pub fn with_markets(markets: Vec<Market>, now: DateTime<Utc>) -> Self {
        Self {
            client: OddsApiClient::new(None, String::new(), std::time::Duration::from_secs(1)),
            ttl: Duration::days(3650),
            snapshot: RwLock::new(CatalogSnapshot {
                markets,
                fetched_at: Some(now),
            }),
        }
    }

    /// Current markets, optionally filtered by sport tag. Refreshes from the
    /// feed when the cache has aged past the TTL; falls back to the seed
    /// catalog when every sport fails.
    pub async fn markets(&self, sport_filter: &str, now: DateTime<Utc>) -> Vec<Market> {
        if self.is_stale(now) {
            self.refresh(now).await;
        }

        let snapshot = self.snapshot.read().unwrap();
        if sport_filter.is_empty() || sport_filter == "all" {
            snapshot.markets.clone()
        } else {
            snapshot
                .markets
                .iter()
                .filter(|m| m.sport == sport_filter)
                .cloned()
                .collect()
        }
    }

    /// Markets still accepting wagers.
    pub async fn open_markets(&self, now: DateTime<Utc>) -> Vec<Market> {
        self.markets("all", now)
            .await
            .into_iter()
            .filter(|m| m.is_open(now))
            .collect()
    }

    /// Look up a market in the current snapshot without triggering a refresh.
    pub fn market(&self, market_id: &str) -> Option<Market> {
        let snapshot = self.snapshot.read().unwrap();
        snapshot.markets.iter().find(|m| m.id == market_id).cloned()
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        let snapshot = self.snapshot.read().unwrap();
        match snapshot.fetched_at {
            Some(fetched) => now - fetched >= self.ttl || snapshot.markets.is_empty(),
            None => true,
        }
    }

    /// Refresh every supported sport. A failure for one sport must not abort
    /// the others; an overall empty result triggers the seed fallback.
    async fn refresh(&self, now: DateTime<Utc>) {
        let mut fresh: Vec<Market> = Vec::new();

        for (sport, sport_key) in SUPPORTED_SPORTS {
            match self.client.fetch_sport(sport, sport_key).await {
                Ok(mut markets) => fresh.append(&mut markets),
                Err(ProviderError::NotConfigured) => {
                    // No API key: quietly use the seed catalog below.
                }
                Err(e) => {
                    tracing::warn!("odds refresh failed for {}: {}", sport, e);
                }
            }
        }

        if fresh.is_empty() {
            tracing::info!("no live odds available, falling back to seed catalog");
            fresh = seed::seed_markets(now);
        } else {
            tracing::info!("cached {} markets from odds feed", fresh.len());
        }

        let mut snapshot = self.snapshot.write().unwrap();
        *snapshot = CatalogSnapshot {
            markets: fresh,
            fetched_at: Some(now),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_feed_falls_back_to_seed() {
        let client = OddsApiClient::new(None, String::new(), std::time::Duration::from_secs(1));
        let catalog = MarketCatalog::new(client, Duration::minutes(5));
        let now = Utc::now();

        let markets = catalog.markets("all", now).await;
        assert!(!markets.is_empty(), "seed catalog should populate the cache");
        assert!(markets.iter().all(|m| !m.selections.is_empty()));
    }

    #[tokio::test]
    async fn test_sport_filter() {
        let now = Utc::now();
        let catalog = MarketCatalog::with_markets(seed::seed_markets(now), now);

        let nfl = catalog.markets("nfl", now).await;
        assert!(!nfl.is_empty());
        assert!(nfl.iter().all(|m| m.sport == "nfl"));

        let all = catalog.markets("all", now).await;
        assert!(all.len() > nfl.len());
    }

    #[tokio::test]
    async fn test_status_recomputed_on_read() {
        let now = Utc::now();
        let markets = seed::seed_markets(now);
        let market = markets[0].clone();

        assert_eq!(market.status(now), "open");
        assert_eq!(market.status(market.close_time + Duration::seconds(1)), "closed");
        // Exactly at close time the market is already locked.
        assert_eq!(market.status(market.close_time), "closed");
    }
}
