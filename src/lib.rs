/// Payday simulated sportsbook
/// Exports all modules for use as a library crate

pub mod app_state;
pub mod bank;
pub mod catalog;
pub mod config;
pub mod handlers;
pub mod models;
pub mod odds;
pub mod rob;
pub mod settlement;
pub mod wagers;

pub use app_state::{AppServices, AppState, SharedState};
pub use bank::Bank;
pub use catalog::{Market, MarketCatalog, OddsApiClient, ProviderError, Selection, SUPPORTED_SPORTS};
pub use config::Config;
pub use rob::{
    Analysis, RobAnalyst, SuggestError, Suggestion, SuggestionBook, MAX_PARLAY_PICKS,
    ROB_FEE_PERCENTAGE, SUGGESTION_TTL_HOURS,
};
pub use settlement::{settlement_stats, SettlementEngine, SettlementStats, GRACE_HOURS};
pub use wagers::{
    BetSelection, Wager, WagerBook, WagerError, WagerKind, WagerRequest, WagerStatus,
};
