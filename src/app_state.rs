// Application state management

use crate::bank::Bank;
use crate::catalog::MarketCatalog;
use crate::rob::{RobAnalyst, SuggestionBook};
use crate::settlement::SettlementEngine;
use crate::wagers::WagerBook;
use std::sync::{Arc, Mutex};

pub type SharedState = Arc<Mutex<AppState>>;

/// Mutable book state. Every balance-touching operation (placement,
/// cancellation, settlement, deposit) runs under this one lock, which is
/// what serializes concurrent operations for the same user. The market
/// catalog lives outside so odds refreshes never hold it.
pub struct AppState {
    pub bank: Bank,
    pub wagers: WagerBook,
    pub suggestions: SuggestionBook,
    pub settlement: SettlementEngine,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            bank: Bank::new(),
            wagers: WagerBook::new(),
            suggestions: SuggestionBook::new(),
            settlement: SettlementEngine::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the handlers need, cloneable for axum.
#[derive(Clone)]
pub struct AppServices {
    pub state: SharedState,
    pub catalog: Arc<MarketCatalog>,
    pub analyst: Arc<RobAnalyst>,
    /// Fee percentage stamped on new suggestions
    pub rob_fee_percentage: f64,
    /// Shared secret for admin endpoints; None disables them
    pub admin_token: Option<String>,
}
