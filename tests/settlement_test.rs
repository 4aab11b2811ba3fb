// Settlement behavior: idempotency, the grace window, forced results, and
// the stats rollup. Engines are seeded and the clock is explicit.

use chrono::{DateTime, Duration, Utc};
use payday_sportsbook::settlement::settlement_stats;
use payday_sportsbook::wagers::{BetSelection, WagerError, WagerKind, WagerRequest, WagerStatus};
use payday_sportsbook::{Bank, Market, Selection, SettlementEngine, SuggestionBook, WagerBook};

fn market(id: &str, close_time: DateTime<Utc>, price: i32) -> Market {
    Market {
        id: id.to_string(),
        sport: "nba".to_string(),
        event: format!("Event {}", id),
        home_team: "Home".to_string(),
        away_team: "Away".to_string(),
        start_time: close_time,
        close_time,
        selections: vec![
            Selection {
                id: format!("{}-home", id),
                name: "Home ML".to_string(),
                odds: price,
            },
            Selection {
                id: format!("{}-away", id),
                name: "Away ML".to_string(),
                odds: -price,
            },
        ],
    }
}

fn place_single(
    bank: &mut Bank,
    book: &mut WagerBook,
    suggestions: &mut SuggestionBook,
    market: &Market,
    user: &str,
    stake: f64,
    placed_at: DateTime<Utc>,
) -> String {
    let selection = &market.selections[0];
    let request = WagerRequest {
        kind: WagerKind::Single,
        combined_odds: selection.odds,
        selections: vec![BetSelection {
            market_id: market.id.clone(),
            market_event: market.event.clone(),
            selection_id: selection.id.clone(),
            selection_name: selection.name.clone(),
            odds: selection.odds,
            sport: market.sport.clone(),
        }],
        stake,
    };
    let (created, _) = book
        .place(bank, suggestions, std::slice::from_ref(market), user, &[request], placed_at)
        .unwrap();
    created[0].id.clone()
}

#[test]
fn test_forced_settlement_is_idempotent() {
    let placed_at = Utc::now();
    let mut bank = Bank::new();
    let mut book = WagerBook::new();
    let mut suggestions = SuggestionBook::new();
    let mut engine = SettlementEngine::with_seed(1);

    let m = market("m1", placed_at + Duration::hours(1), 150);
    bank.deposit("alice", 100.0).unwrap();
    let wager_id = place_single(&mut bank, &mut book, &mut suggestions, &m, "alice", 10.0, placed_at);
    assert_eq!(bank.balance("alice"), 90.0);

    let settle_at = placed_at + Duration::hours(5);
    let settled = engine
        .settle_one(&mut book, &mut bank, &wager_id, Some(true), settle_at)
        .unwrap();
    assert_eq!(settled.status, WagerStatus::Won);
    assert_eq!(settled.payout, Some(25.0));
    assert!(!settled.can_cancel);
    assert_eq!(settled.settled_at, Some(settle_at));
    assert_eq!(bank.balance("alice"), 115.0);

    // Settling again must not credit a second time.
    let err = engine
        .settle_one(&mut book, &mut bank, &wager_id, Some(true), settle_at)
        .unwrap_err();
    assert!(matches!(err, WagerError::NotOpen(_)));
    assert_eq!(bank.balance("alice"), 115.0);
}

#[test]
fn test_forced_loss_pays_nothing() {
    let placed_at = Utc::now();
    let mut bank = Bank::new();
    let mut book = WagerBook::new();
    let mut suggestions = SuggestionBook::new();
    let mut engine = SettlementEngine::with_seed(1);

    let m = market("m1", placed_at + Duration::hours(1), 150);
    bank.deposit("bob", 50.0).unwrap();
    let wager_id = place_single(&mut bank, &mut book, &mut suggestions, &m, "bob", 10.0, placed_at);

    let settled = engine
        .settle_one(&mut book, &mut bank, &wager_id, Some(false), placed_at + Duration::hours(5))
        .unwrap();
    assert_eq!(settled.status, WagerStatus::Lost);
    assert_eq!(settled.payout, Some(0.0));
    assert_eq!(bank.balance("bob"), 40.0);
}

#[test]
fn test_settling_unknown_wager_fails() {
    let mut bank = Bank::new();
    let mut book = WagerBook::new();
    let mut engine = SettlementEngine::with_seed(1);

    let err = engine
        .settle_one(&mut book, &mut bank, "no-such-wager", None, Utc::now())
        .unwrap_err();
    assert!(matches!(err, WagerError::NotFound(_)));
}

#[test]
fn test_sweep_honors_grace_window() {
    let placed_at = Utc::now();
    let mut bank = Bank::new();
    let mut book = WagerBook::new();
    let mut suggestions = SuggestionBook::new();
    let mut engine = SettlementEngine::with_seed(42);

    // One event starts in 1 hour, the other in 8 hours.
    let soon = market("soon", placed_at + Duration::hours(1), 150);
    let later = market("later", placed_at + Duration::hours(8), 150);
    bank.deposit("carol", 100.0).unwrap();
    let soon_id = place_single(&mut bank, &mut book, &mut suggestions, &soon, "carol", 10.0, placed_at);
    let later_id = place_single(&mut bank, &mut book, &mut suggestions, &later, "carol", 10.0, placed_at);

    // Two hours in, neither event has cleared the 3 hour grace window.
    assert_eq!(engine.sweep(&mut book, &mut bank, placed_at + Duration::hours(2)), 0);

    // Five hours in, only the early event has concluded.
    assert_eq!(engine.sweep(&mut book, &mut bank, placed_at + Duration::hours(5)), 1);
    assert_ne!(book.get(&soon_id).unwrap().status, WagerStatus::Open);
    assert_eq!(book.get(&later_id).unwrap().status, WagerStatus::Open);

    // Twelve hours in, the second one settles; rerunning settles nothing.
    let late = placed_at + Duration::hours(12);
    assert_eq!(engine.sweep(&mut book, &mut bank, late), 1);
    assert_eq!(engine.sweep(&mut book, &mut bank, late), 0);
}

#[test]
fn test_sweep_payout_matches_outcome() {
    let placed_at = Utc::now();
    let mut bank = Bank::new();
    let mut book = WagerBook::new();
    let mut suggestions = SuggestionBook::new();
    let mut engine = SettlementEngine::with_seed(7);

    let m = market("m1", placed_at + Duration::hours(1), 150);
    bank.deposit("dave", 100.0).unwrap();
    let wager_id = place_single(&mut bank, &mut book, &mut suggestions, &m, "dave", 10.0, placed_at);

    engine.sweep(&mut book, &mut bank, placed_at + Duration::hours(5));
    let wager = book.get(&wager_id).unwrap();
    match wager.status {
        WagerStatus::Won => {
            assert_eq!(wager.payout, Some(25.0));
            assert!((bank.balance("dave") - 115.0).abs() < 1e-9);
        }
        WagerStatus::Lost => {
            assert_eq!(wager.payout, Some(0.0));
            assert!((bank.balance("dave") - 90.0).abs() < 1e-9);
        }
        other => panic!("unexpected status after sweep: {:?}", other),
    }
    assert!(wager.settled_at.is_some());
}

#[test]
fn test_settlement_stats_rollup() {
    let placed_at = Utc::now();
    let mut bank = Bank::new();
    let mut book = WagerBook::new();
    let mut suggestions = SuggestionBook::new();
    let mut engine = SettlementEngine::with_seed(3);

    let m = market("m1", placed_at + Duration::hours(1), 150);
    bank.deposit("erin", 100.0).unwrap();
    let won = place_single(&mut bank, &mut book, &mut suggestions, &m, "erin", 10.0, placed_at);
    let lost = place_single(&mut bank, &mut book, &mut suggestions, &m, "erin", 10.0, placed_at);
    let cancelled = place_single(&mut bank, &mut book, &mut suggestions, &m, "erin", 10.0, placed_at);
    let _open = place_single(&mut bank, &mut book, &mut suggestions, &m, "erin", 10.0, placed_at);

    let settle_at = placed_at + Duration::hours(5);
    engine
        .settle_one(&mut book, &mut bank, &won, Some(true), settle_at)
        .unwrap();
    engine
        .settle_one(&mut book, &mut bank, &lost, Some(false), settle_at)
        .unwrap();
    book.cancel(&mut bank, std::slice::from_ref(&m), "erin", &cancelled, placed_at)
        .unwrap();

    let stats = settlement_stats(&book);
    assert_eq!(stats.total_wagers, 4);
    assert_eq!(stats.open, 1);
    assert_eq!(stats.won, 1);
    assert_eq!(stats.lost, 1);
    assert_eq!(stats.cancelled, 1);
    assert!((stats.total_payouts - 25.0).abs() < 1e-9);
}
