// ============================================================================
// Wager Ledger - placement, cancellation, and wager bookkeeping
// ============================================================================
//
// Owns wager records and the balance mutations tied to them. Placement is
// all-or-nothing per batch: every validation runs before any wager is stored
// or any money moves.

use crate::bank::Bank;
use crate::catalog::Market;
use crate::odds;
use crate::rob::SuggestionBook;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WagerKind {
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "parlay")]
    Parlay,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WagerStatus {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "won")]
    Won,
    #[serde(rename = "lost")]
    Lost,
    #[serde(rename = "cancelled")]
    Cancelled,
}

/// One leg of a wager or suggestion. Odds are frozen at placement time;
/// later catalog refreshes never touch them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetSelection {
    pub market_id: String,
    pub market_event: String,
    pub selection_id: String,
    pub selection_name: String,
    pub odds: i32,
    pub sport: String,
}

/// One requested wager inside a placement batch: one per selected single,
/// or exactly one parlay bundling all legs.
#[derive(Debug, Clone, Deserialize)]
pub struct WagerRequest {
    #[serde(rename = "type")]
    pub kind: WagerKind,
    pub selections: Vec<BetSelection>,
    pub stake: f64,
    /// Combined American odds declared by the requester (single leg odds
    /// for a single wager).
    pub combined_odds: i32,
}

/// A placed bet.
#[derive(Debug, Clone, Serialize)]
pub struct Wager {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: WagerKind,
    pub selections: Vec<BetSelection>,
    pub stake: f64,
    /// Combined odds before any advisory fee
    pub original_odds: i32,
    /// Fee-adjusted odds actually used for the payout
    pub combined_odds: i32,
    pub potential_payout: f64,
    pub status: WagerStatus,
    pub can_cancel: bool,
    pub is_rob_pick: bool,
    pub suggestion_id: Option<String>,
    pub fee_applied: f64,
    /// Scheduled start of the underlying event; drives auto-settlement
    pub event_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub payout: Option<f64>,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum WagerError {
    InvalidRequest(String),
    InsufficientBalance(String),
    MarketClosed(String),
    MarketLocked(String),
    NotFound(String),
    NotOwner(String),
    NotOpen(String),
}

impl WagerError {
    /// Machine-readable error tag for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            WagerError::InvalidRequest(_) => "invalid_request",
            WagerError::InsufficientBalance(_) => "insufficient_balance",
            WagerError::MarketClosed(_) => "market_closed",
            WagerError::MarketLocked(_) => "market_locked",
            WagerError::NotFound(_) => "not_found",
            WagerError::NotOwner(_) => "not_owner",
            WagerError::NotOpen(_) => "not_open",
        }
    }
}

impl std::fmt::Display for WagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WagerError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            WagerError::InsufficientBalance(msg) => write!(f, "Insufficient balance: {}", msg),
            WagerError::MarketClosed(msg) => write!(f, "Market closed: {}", msg),
            WagerError::MarketLocked(msg) => write!(f, "Market locked: {}", msg),
            WagerError::NotFound(msg) => write!(f, "Not found: {}", msg),
            WagerError::NotOwner(msg) => write!(f, "Not authorized: {}", msg),
            WagerError::NotOpen(msg) => write!(f, "Not open: {}", msg),
        }
    }
}

impl std::error::Error for WagerError {}

// ============================================================================
// WAGER BOOK
// ============================================================================

/// All wager records, keyed by wager id, with a per-user index.
#[derive(Debug, Default)]
pub struct WagerBook {
    wagers: HashMap<String, Wager>,
    user_wagers: HashMap<String, Vec<String>>,
}

impl WagerBook {
    pub fn new() -> Self {
        Self {
            wagers: HashMap::new(),
            user_wagers: HashMap::new(),
        }
    }

    /// Place a batch of wagers against the user's balance.
    ///
    /// Validation order: request shape, total stake vs balance, market lock
    /// times. Only after every wager in the batch is constructed does the
    /// single debit happen, so a failure anywhere leaves balance and wager
    /// state untouched.
    pub fn place(
        &mut self,
        bank: &mut Bank,
        suggestions: &mut SuggestionBook,
        markets: &[Market],
        user_id: &str,
        requests: &[WagerRequest],
        now: DateTime<Utc>,
    ) -> Result<(Vec<Wager>, f64), WagerError> {
        if user_id.is_empty() {
            return Err(WagerError::InvalidRequest("user id required".to_string()));
        }
        if requests.is_empty() {
            return Err(WagerError::InvalidRequest("no bets in request".to_string()));
        }
        for request in requests {
            if request.selections.is_empty() {
                return Err(WagerError::InvalidRequest(
                    "bet has no selections".to_string(),
                ));
            }
            if request.kind == WagerKind::Single && request.selections.len() != 1 {
                return Err(WagerError::InvalidRequest(
                    "single bet must have exactly one selection".to_string(),
                ));
            }
            if !request.stake.is_finite() || request.stake <= 0.0 {
                return Err(WagerError::InvalidRequest(
                    "stake must be positive".to_string(),
                ));
            }
        }

        let total_stake: f64 = requests.iter().map(|r| r.stake).sum();
        if total_stake > bank.balance(user_id) {
            return Err(WagerError::InsufficientBalance(format!(
                "{} < {}",
                bank.balance(user_id),
                total_stake
            )));
        }

        // Every referenced market must still be accepting wagers.
        for request in requests {
            for selection in &request.selections {
                let market = markets
                    .iter()
                    .find(|m| m.id == selection.market_id)
                    .ok_or_else(|| {
                        WagerError::MarketClosed(format!(
                            "market {} is closed",
                            selection.market_event
                        ))
                    })?;
                if !market.is_open(now) {
                    return Err(WagerError::MarketClosed(format!(
                        "market {} is closed",
                        selection.market_event
                    )));
                }
            }
        }

        let mut created = Vec::with_capacity(requests.len());
        for request in requests {
            // Wagers matching an active Rob suggestion take the payout fee.
            let matched = suggestions.find_match(&request.selections, now);
            let (combined_odds, suggestion_id, fee_applied) = match &matched {
                Some((id, fee)) => (
                    odds::apply_fee(request.combined_odds, *fee),
                    Some(id.clone()),
                    *fee,
                ),
                None => (request.combined_odds, None, 0.0),
            };
            if let Some((id, _)) = &matched {
                suggestions.mark_used(id, user_id);
            }

            let event_time = request
                .selections
                .first()
                .and_then(|sel| markets.iter().find(|m| m.id == sel.market_id))
                .map(|m| m.start_time)
                .unwrap_or(now);

            created.push(Wager {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                kind: request.kind,
                selections: request.selections.clone(),
                stake: request.stake,
                original_odds: request.combined_odds,
                combined_odds,
                potential_payout: odds::payout(combined_odds, request.stake),
                status: WagerStatus::Open,
                can_cancel: true,
                is_rob_pick: matched.is_some(),
                suggestion_id,
                fee_applied,
                event_time,
                created_at: now,
                settled_at: None,
                cancelled_at: None,
                payout: None,
            });
        }

        // Single debit for the whole batch, after construction succeeded.
        let new_balance = bank
            .debit(user_id, total_stake)
            .map_err(WagerError::InsufficientBalance)?;

        for wager in &created {
            self.user_wagers
                .entry(user_id.to_string())
                .or_default()
                .push(wager.id.clone());
            self.wagers.insert(wager.id.clone(), wager.clone());
        }

        tracing::info!(
            "placed {} wager(s) for {} (total stake {:.2})",
            created.len(),
            user_id,
            total_stake
        );
        Ok((created, new_balance))
    }

    /// Cancel an open wager and refund the stake. Only allowed while every
    /// referenced market is still unlocked.
    pub fn cancel(
        &mut self,
        bank: &mut Bank,
        markets: &[Market],
        user_id: &str,
        wager_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(Wager, f64), WagerError> {
        let wager = self
            .wagers
            .get_mut(wager_id)
            .ok_or_else(|| WagerError::NotFound(format!("wager {}", wager_id)))?;

        if wager.user_id != user_id {
            return Err(WagerError::NotOwner("wager belongs to another user".to_string()));
        }
        if wager.status != WagerStatus::Open {
            return Err(WagerError::NotOpen("wager is not open".to_string()));
        }

        let all_unlocked = wager.selections.iter().all(|sel| {
            markets
                .iter()
                .find(|m| m.id == sel.market_id)
                .map(|m| m.is_open(now))
                .unwrap_or(false)
        });
        if !all_unlocked {
            return Err(WagerError::MarketLocked(
                "cannot cancel - market has closed".to_string(),
            ));
        }

        wager.status = WagerStatus::Cancelled;
        wager.can_cancel = false;
        wager.cancelled_at = Some(now);

        let new_balance = bank.credit(user_id, wager.stake);
        tracing::info!("cancelled wager {} for {} (refund {:.2})", wager_id, user_id, wager.stake);
        Ok((wager.clone(), new_balance))
    }

    /// Wagers for a user, newest first. `can_cancel` is recomputed from
    /// current market lock times for every open wager; the stored flag is
    /// never trusted on read.
    pub fn list(
        &self,
        markets: &[Market],
        user_id: &str,
        status_filter: &str,
        now: DateTime<Utc>,
    ) -> Vec<Wager> {
        let ids = match self.user_wagers.get(user_id) {
            Some(ids) => ids,
            None => return Vec::new(),
        };

        let mut wagers: Vec<Wager> = ids
            .iter()
            .filter_map(|id| self.wagers.get(id))
            .filter(|w| match status_filter {
                "open" => w.status == WagerStatus::Open,
                "settled" => w.status != WagerStatus::Open,
                _ => true,
            })
            .cloned()
            .collect();

        for wager in &mut wagers {
            if wager.status == WagerStatus::Open {
                wager.can_cancel = wager.selections.iter().all(|sel| {
                    markets
                        .iter()
                        .find(|m| m.id == sel.market_id)
                        .map(|m| m.is_open(now))
                        .unwrap_or(false)
                });
            }
        }

        wagers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        wagers
    }

    pub fn get(&self, wager_id: &str) -> Option<&Wager> {
        self.wagers.get(wager_id)
    }

    pub fn get_mut(&mut self, wager_id: &str) -> Option<&mut Wager> {
        self.wagers.get_mut(wager_id)
    }

    /// Ids of open wagers whose event concluded before `cutoff`.
    pub fn due_for_settlement(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        self.wagers
            .values()
            .filter(|w| w.status == WagerStatus::Open && w.event_time < cutoff)
            .map(|w| w.id.clone())
            .collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &Wager> {
        self.wagers.values()
    }
}
