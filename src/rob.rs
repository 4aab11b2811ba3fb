// ============================================================================
// Rob - the advisory pick engine
// ============================================================================
//
// Generates time-limited betting suggestions from the open catalog and
// matches later wagers against them to apply the payout-reducing fee.
// Pick selection prefers an external analysis provider when configured and
// falls back to implied-probability ranking; the natural-language quality
// of the reasoning is not this module's concern.

use crate::catalog::Market;
use crate::catalog::ProviderError;
use crate::odds;
use crate::wagers::{BetSelection, WagerKind};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Fee taken from the payout when a wager follows one of Rob's picks.
pub const ROB_FEE_PERCENTAGE: f64 = 10.0;

/// How long a suggestion stays matchable.
pub const SUGGESTION_TTL_HOURS: i64 = 2;

/// Parlay suggestions carry at most this many legs.
pub const MAX_PARLAY_PICKS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestError {
    NoOpenMarkets,
}

impl std::fmt::Display for SuggestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestError::NoOpenMarkets => write!(f, "No open markets available for picks"),
        }
    }
}

impl std::error::Error for SuggestError {}

/// An advisory pick. Read-only after creation except for `used_by`; expired
/// suggestions are filtered out, never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WagerKind,
    pub selections: Vec<BetSelection>,
    pub fee_percentage: f64,
    pub confidence: u32,
    pub reasoning: String,
    pub expires_at: DateTime<Utc>,
    pub used_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Suggestion {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

// ============================================================================
// SUGGESTION BOOK
// ============================================================================

#[derive(Debug, Default)]
pub struct SuggestionBook {
    suggestions: HashMap<String, Suggestion>,
}

impl SuggestionBook {
    pub fn new() -> Self {
        Self {
            suggestions: HashMap::new(),
        }
    }

    pub fn insert(&mut self, suggestion: Suggestion) {
        self.suggestions
            .insert(suggestion.id.clone(), suggestion);
    }

    pub fn get(&self, id: &str) -> Option<&Suggestion> {
        self.suggestions.get(id)
    }

    /// Non-expired suggestions, newest first.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Suggestion> {
        let mut active: Vec<Suggestion> = self
            .suggestions
            .values()
            .filter(|s| s.is_active(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        active
    }

    /// Find an active suggestion whose leg set equals the given legs (same
    /// market+selection pairs, same cardinality). When several active
    /// suggestions share a leg set the most recently created one wins.
    /// Returns the suggestion id and its fee percentage.
    pub fn find_match(
        &self,
        legs: &[BetSelection],
        now: DateTime<Utc>,
    ) -> Option<(String, f64)> {
        let mut best: Option<&Suggestion> = None;

        for suggestion in self.suggestions.values().filter(|s| s.is_active(now)) {
            if suggestion.selections.len() != legs.len() {
                continue;
            }
            let all_match = legs.iter().all(|leg| {
                suggestion.selections.iter().any(|pick| {
                    pick.market_id == leg.market_id && pick.selection_id == leg.selection_id
                })
            });
            if all_match {
                let newer = best
                    .map(|b| suggestion.created_at > b.created_at)
                    .unwrap_or(true);
                if newer {
                    best = Some(suggestion);
                }
            }
        }

        best.map(|s| (s.id.clone(), s.fee_percentage))
    }

    /// Record that a user's wager triggered the fee for this suggestion.
    pub fn mark_used(&mut self, suggestion_id: &str, user_id: &str) {
        if let Some(suggestion) = self.suggestions.get_mut(suggestion_id) {
            if !suggestion.used_by.iter().any(|u| u == user_id) {
                suggestion.used_by.push(user_id.to_string());
            }
        }
    }
}

// ============================================================================
// PICK GENERATION
// ============================================================================

/// How many legs a suggestion of this kind gets from the open catalog.
pub fn num_picks(kind: WagerKind, open_market_count: usize) -> usize {
    match kind {
        WagerKind::Single => 1,
        WagerKind::Parlay => open_market_count.min(MAX_PARLAY_PICKS),
    }
}

/// Build a suggestion from the open markets. `analysis` is the external
/// provider's output when it succeeded; otherwise the favorites strategy
/// picks by implied probability.
pub fn build_suggestion(
    open_markets: &[Market],
    kind: WagerKind,
    analysis: Option<Analysis>,
    fee_percentage: f64,
    now: DateTime<Utc>,
) -> Result<Suggestion, SuggestError> {
    if open_markets.is_empty() {
        return Err(SuggestError::NoOpenMarkets);
    }

    let wanted = num_picks(kind, open_markets.len());

    let (selections, reasoning, confidence) = match analysis {
        Some(analysis) => {
            let resolved = resolve_analysis_picks(open_markets, &analysis.picks);
            if resolved.is_empty() {
                favorites_fallback(open_markets, wanted)
            } else {
                (resolved, analysis.reasoning, analysis.confidence)
            }
        }
        None => favorites_fallback(open_markets, wanted),
    };

    if selections.is_empty() {
        return Err(SuggestError::NoOpenMarkets);
    }

    Ok(Suggestion {
        id: uuid::Uuid::new_v4().to_string(),
        kind,
        selections,
        fee_percentage,
        confidence,
        reasoning,
        expires_at: now + Duration::hours(SUGGESTION_TTL_HOURS),
        used_by: Vec::new(),
        created_at: now,
    })
}

fn favorites_fallback(open_markets: &[Market], wanted: usize) -> (Vec<BetSelection>, String, u32) {
    (
        pick_favorites(open_markets, wanted),
        "Selected based on favorable odds and implied probability analysis".to_string(),
        72,
    )
}

/// Favorites strategy: rank moneyline/winner selections by implied win
/// probability, prefer the 55-75% band (moderate favorites, no heavy chalk),
/// draw from distinct markets where possible, and pad from the remaining
/// favorites when short.
pub fn pick_favorites(open_markets: &[Market], wanted: usize) -> Vec<BetSelection> {
    struct Ranked<'a> {
        market: &'a Market,
        selection: &'a crate::catalog::Selection,
        implied: u32,
    }

    let mut all: Vec<Ranked> = Vec::new();
    for market in open_markets {
        for selection in &market.selections {
            // Totals rows are not winner picks.
            if selection.name.contains("Over") || selection.name.contains("Under") {
                continue;
            }
            all.push(Ranked {
                market,
                selection,
                implied: odds::implied_probability(selection.odds),
            });
        }
    }

    let mut good: Vec<&Ranked> = all
        .iter()
        .filter(|r| r.implied >= 55 && r.implied <= 75)
        .collect();
    good.sort_by(|a, b| b.implied.cmp(&a.implied));

    let mut picks: Vec<BetSelection> = Vec::new();
    let mut used_markets: HashSet<&str> = HashSet::new();

    for ranked in good {
        if picks.len() >= wanted {
            break;
        }
        if used_markets.contains(ranked.market.id.as_str()) {
            continue;
        }
        picks.push(to_leg(ranked.market, ranked.selection));
        used_markets.insert(ranked.market.id.as_str());
    }

    if picks.len() < wanted {
        let mut remaining: Vec<&Ranked> = all
            .iter()
            .filter(|r| !used_markets.contains(r.market.id.as_str()))
            .collect();
        remaining.sort_by(|a, b| b.implied.cmp(&a.implied));

        for ranked in remaining {
            if picks.len() >= wanted {
                break;
            }
            if used_markets.contains(ranked.market.id.as_str()) {
                continue;
            }
            picks.push(to_leg(ranked.market, ranked.selection));
            used_markets.insert(ranked.market.id.as_str());
        }
    }

    picks
}

fn to_leg(market: &Market, selection: &crate::catalog::Selection) -> BetSelection {
    BetSelection {
        market_id: market.id.clone(),
        market_event: market.event.clone(),
        selection_id: selection.id.clone(),
        selection_name: selection.name.clone(),
        odds: selection.odds,
        sport: market.sport.clone(),
    }
}

fn resolve_analysis_picks(open_markets: &[Market], picks: &[AnalysisPick]) -> Vec<BetSelection> {
    let mut resolved = Vec::new();
    for pick in picks {
        let market = match open_markets.iter().find(|m| m.id == pick.market_id) {
            Some(m) => m,
            None => continue,
        };
        if let Some(selection) = market.selection(&pick.selection_id) {
            resolved.push(to_leg(market, selection));
        }
    }
    resolved
}

// ============================================================================
// EXTERNAL ANALYSIS PROVIDER
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisPick {
    pub market_id: String,
    pub selection_id: String,
}

/// Output of the external analysis provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Analysis {
    pub picks: Vec<AnalysisPick>,
    pub reasoning: String,
    pub confidence: u32,
}

#[derive(Debug, Serialize)]
struct AnalysisMarket<'a> {
    id: &'a str,
    sport: &'a str,
    event: &'a str,
    selections: Vec<AnalysisSelection<'a>>,
}

#[derive(Debug, Serialize)]
struct AnalysisSelection<'a> {
    id: &'a str,
    name: &'a str,
    odds: i32,
    implied_probability: u32,
}

/// Client for the external betting-analysis service. Unconfigured or failed
/// calls fall back to the favorites strategy; this call never blocks a
/// wagering request.
pub struct RobAnalyst {
    endpoint: Option<String>,
    client: Client,
}

impl RobAnalyst {
    pub fn new(endpoint: Option<String>, timeout: std::time::Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { endpoint, client }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Ask the analysis service for picks over the first few open markets.
    pub async fn analyze(
        &self,
        open_markets: &[Market],
        wanted: usize,
        kind: WagerKind,
    ) -> Result<Analysis, ProviderError> {
        let endpoint = self.endpoint.as_ref().ok_or(ProviderError::NotConfigured)?;

        let markets: Vec<AnalysisMarket> = open_markets
            .iter()
            .take(10)
            .map(|m| AnalysisMarket {
                id: &m.id,
                sport: &m.sport,
                event: &m.event,
                selections: m
                    .selections
                    .iter()
                    .map(|s| AnalysisSelection {
                        id: &s.id,
                        name: &s.name,
                        odds: s.odds,
                        implied_probability: odds::implied_probability(s.odds),
                    })
                    .collect(),
            })
            .collect();

        let body = serde_json::json!({
            "markets": markets,
            "num_picks": wanted,
            "kind": kind,
        });

        let response = self
            .client
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "analysis service returned {}",
                response.status()
            )));
        }

        response
            .json::<Analysis>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::seed_markets;

    fn leg(market_id: &str, selection_id: &str) -> BetSelection {
        BetSelection {
            market_id: market_id.to_string(),
            market_event: "Test Event".to_string(),
            selection_id: selection_id.to_string(),
            selection_name: "Test Pick".to_string(),
            odds: -110,
            sport: "nfl".to_string(),
        }
    }

    fn suggestion(id: &str, legs: Vec<BetSelection>, created_at: DateTime<Utc>) -> Suggestion {
        Suggestion {
            id: id.to_string(),
            kind: WagerKind::Single,
            selections: legs,
            fee_percentage: ROB_FEE_PERCENTAGE,
            confidence: 75,
            reasoning: String::new(),
            expires_at: created_at + Duration::hours(SUGGESTION_TTL_HOURS),
            used_by: Vec::new(),
            created_at,
        }
    }

    #[test]
    fn test_find_match_set_equality() {
        let now = Utc::now();
        let mut book = SuggestionBook::new();
        book.insert(suggestion("s1", vec![leg("m1", "a")], now));

        assert!(book.find_match(&[leg("m1", "a")], now).is_some());
        assert!(book.find_match(&[leg("m1", "b")], now).is_none());
        // Different cardinality never matches.
        assert!(book
            .find_match(&[leg("m1", "a"), leg("m2", "c")], now)
            .is_none());
    }

    #[test]
    fn test_find_match_ignores_expired() {
        let now = Utc::now();
        let mut book = SuggestionBook::new();
        book.insert(suggestion(
            "s1",
            vec![leg("m1", "a")],
            now - Duration::hours(SUGGESTION_TTL_HOURS + 1),
        ));
        assert!(book.find_match(&[leg("m1", "a")], now).is_none());
    }

    #[test]
    fn test_find_match_prefers_newest() {
        let now = Utc::now();
        let mut book = SuggestionBook::new();
        book.insert(suggestion("older", vec![leg("m1", "a")], now - Duration::minutes(30)));
        book.insert(suggestion("newer", vec![leg("m1", "a")], now - Duration::minutes(5)));

        let (id, _) = book.find_match(&[leg("m1", "a")], now).unwrap();
        assert_eq!(id, "newer");
    }

    #[test]
    fn test_mark_used_is_idempotent() {
        let now = Utc::now();
        let mut book = SuggestionBook::new();
        book.insert(suggestion("s1", vec![leg("m1", "a")], now));

        book.mark_used("s1", "alice");
        book.mark_used("s1", "alice");
        assert_eq!(book.get("s1").unwrap().used_by, vec!["alice".to_string()]);
    }

    #[test]
    fn test_pick_favorites_distinct_markets() {
        let markets = seed_markets(Utc::now());
        let picks = pick_favorites(&markets, 3);
        assert!(!picks.is_empty());

        let mut market_ids: Vec<&str> = picks.iter().map(|p| p.market_id.as_str()).collect();
        market_ids.sort();
        market_ids.dedup();
        assert_eq!(market_ids.len(), picks.len(), "picks must span distinct markets");

        for pick in &picks {
            assert!(!pick.selection_name.contains("Over"));
            assert!(!pick.selection_name.contains("Under"));
        }
    }

    #[test]
    fn test_build_suggestion_no_open_markets() {
        let err = build_suggestion(&[], WagerKind::Single, None, ROB_FEE_PERCENTAGE, Utc::now());
        assert_eq!(err.unwrap_err(), SuggestError::NoOpenMarkets);
    }

    #[test]
    fn test_build_suggestion_single_and_parlay() {
        let now = Utc::now();
        let markets = seed_markets(now);

        let single =
            build_suggestion(&markets, WagerKind::Single, None, ROB_FEE_PERCENTAGE, now).unwrap();
        assert_eq!(single.selections.len(), 1);
        assert_eq!(single.expires_at, now + Duration::hours(SUGGESTION_TTL_HOURS));

        let parlay =
            build_suggestion(&markets, WagerKind::Parlay, None, ROB_FEE_PERCENTAGE, now).unwrap();
        assert!(parlay.selections.len() > 1 && parlay.selections.len() <= MAX_PARLAY_PICKS);
    }
}
