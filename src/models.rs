// Request bodies for the Payday sportsbook API.
//
// Domain types (Wager, Suggestion, Market) serialize themselves; response
// envelopes are built with serde_json in the handlers.

use crate::wagers::{WagerKind, WagerRequest};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PlaceBetsRequest {
    pub user_id: String,
    pub bets: Vec<WagerRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CancelBetRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    #[serde(rename = "type")]
    pub kind: WagerKind,
}

#[derive(Debug, Deserialize)]
pub struct SettleBetRequest {
    /// "won" or "lost" to force the outcome; omit to simulate
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarketsQuery {
    #[serde(default)]
    pub sport: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BetsQuery {
    pub user_id: String,
    #[serde(default)]
    pub status: Option<String>,
}
