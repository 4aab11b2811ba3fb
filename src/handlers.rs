// HTTP request handlers for the Payday sportsbook API

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::app_state::{AppServices, AppState};
use crate::models::*;
use crate::rob::{self, SuggestError};
use crate::settlement::settlement_stats;
use crate::wagers::WagerError;

type ApiError = (StatusCode, Json<Value>);

fn wager_error(err: &WagerError) -> ApiError {
    let status = match err {
        WagerError::NotFound(_) => StatusCode::NOT_FOUND,
        WagerError::NotOwner(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(json!({ "success": false, "error": err.to_string(), "kind": err.kind() })),
    )
}

fn suggest_error(err: &SuggestError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": err.to_string(), "kind": "no_open_markets" })),
    )
}

/// Admin endpoints check a shared secret; session management belongs to an
/// external collaborator.
fn require_admin(headers: &HeaderMap, expected: &Option<String>) -> Result<(), ApiError> {
    let expected = expected.as_ref().ok_or((
        StatusCode::FORBIDDEN,
        Json(json!({ "success": false, "error": "Admin endpoints disabled", "kind": "unauthorized" })),
    ))?;

    let provided = headers
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided != expected {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Unauthorized", "kind": "unauthorized" })),
        ));
    }
    Ok(())
}

// ===== HEALTH =====

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Server is running" }))
}

// ===== MARKET ENDPOINTS =====

pub async fn get_markets(
    State(services): State<AppServices>,
    Query(query): Query<MarketsQuery>,
) -> Json<Value> {
    let now = Utc::now();
    let sport = query.sport.as_deref().unwrap_or("all");
    let markets = services.catalog.markets(sport, now).await;

    let with_status: Vec<Value> = markets
        .iter()
        .map(|m| {
            json!({
                "id": m.id,
                "sport": m.sport,
                "event": m.event,
                "home_team": m.home_team,
                "away_team": m.away_team,
                "start_time": m.start_time,
                "close_time": m.close_time,
                "status": m.status(now),
                "selections": m.selections,
            })
        })
        .collect();

    Json(json!({ "success": true, "markets": with_status }))
}

// ===== WALLET ENDPOINTS =====

pub async fn get_balance(
    State(services): State<AppServices>,
    Path(user_id): Path<String>,
) -> Json<Value> {
    let state = services.state.lock().unwrap();
    Json(json!({ "success": true, "balance": state.bank.balance(&user_id) }))
}

pub async fn deposit(
    State(services): State<AppServices>,
    Path(user_id): Path<String>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut state = services.state.lock().unwrap();
    match state.bank.deposit(&user_id, request.amount) {
        Ok(new_balance) => Ok(Json(json!({
            "success": true,
            "new_balance": new_balance,
            "deposited": request.amount,
        }))),
        Err(msg) => Err(wager_error(&WagerError::InvalidRequest(msg))),
    }
}

// ===== BETTING ENDPOINTS =====

pub async fn place_bets(
    State(services): State<AppServices>,
    Json(request): Json<PlaceBetsRequest>,
) -> Result<Json<Value>, ApiError> {
    let now = Utc::now();
    // Catalog refresh (possible network I/O) happens before the state lock.
    let markets = services.catalog.markets("all", now).await;

    let mut state = services.state.lock().unwrap();
    let AppState {
        bank,
        wagers,
        suggestions,
        ..
    } = &mut *state;

    let (created, new_balance) = wagers
        .place(bank, suggestions, &markets, &request.user_id, &request.bets, now)
        .map_err(|e| wager_error(&e))?;

    let rob_picks_applied = created.iter().filter(|w| w.is_rob_pick).count();
    Ok(Json(json!({
        "success": true,
        "bets": created,
        "new_balance": new_balance,
        "rob_picks_applied": rob_picks_applied,
    })))
}

pub async fn get_bets(
    State(services): State<AppServices>,
    Query(query): Query<BetsQuery>,
) -> Json<Value> {
    let now = Utc::now();
    let markets = services.catalog.markets("all", now).await;

    let state = services.state.lock().unwrap();
    let status = query.status.as_deref().unwrap_or("all");
    let bets = state.wagers.list(&markets, &query.user_id, status, now);
    Json(json!({ "success": true, "bets": bets }))
}

pub async fn cancel_bet(
    State(services): State<AppServices>,
    Path(bet_id): Path<String>,
    Json(request): Json<CancelBetRequest>,
) -> Result<Json<Value>, ApiError> {
    let now = Utc::now();
    let markets = services.catalog.markets("all", now).await;

    let mut state = services.state.lock().unwrap();
    let AppState { bank, wagers, .. } = &mut *state;

    let (_, new_balance) = wagers
        .cancel(bank, &markets, &request.user_id, &bet_id, now)
        .map_err(|e| wager_error(&e))?;

    Ok(Json(json!({ "success": true, "new_balance": new_balance })))
}

// ===== ROB ENDPOINTS =====

pub async fn get_suggestions(State(services): State<AppServices>) -> Json<Value> {
    let now = Utc::now();
    let state = services.state.lock().unwrap();
    Json(json!({ "success": true, "suggestions": state.suggestions.active(now) }))
}

pub async fn create_suggestion(
    State(services): State<AppServices>,
    Json(request): Json<SuggestRequest>,
) -> Result<Json<Value>, ApiError> {
    let now = Utc::now();
    let open_markets = services.catalog.open_markets(now).await;
    if open_markets.is_empty() {
        return Err(suggest_error(&SuggestError::NoOpenMarkets));
    }

    // External analysis is best-effort: any failure falls back to the
    // favorites strategy inside build_suggestion.
    let wanted = rob::num_picks(request.kind, open_markets.len());
    let analysis = match services.analyst.analyze(&open_markets, wanted, request.kind).await {
        Ok(analysis) => Some(analysis),
        Err(crate::catalog::ProviderError::NotConfigured) => None,
        Err(e) => {
            tracing::warn!("analysis provider failed, using favorites strategy: {}", e);
            None
        }
    };

    let suggestion = rob::build_suggestion(
        &open_markets,
        request.kind,
        analysis,
        services.rob_fee_percentage,
        now,
    )
    .map_err(|e| suggest_error(&e))?;

    let mut state = services.state.lock().unwrap();
    state.suggestions.insert(suggestion.clone());

    Ok(Json(json!({ "success": true, "suggestion": suggestion })))
}

// ===== ADMIN ENDPOINTS =====

pub async fn admin_settle_all(
    State(services): State<AppServices>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_admin(&headers, &services.admin_token)?;

    let now = Utc::now();
    let mut state = services.state.lock().unwrap();
    let AppState {
        bank,
        wagers,
        settlement,
        ..
    } = &mut *state;

    let settled_count = settlement.sweep(wagers, bank, now);
    Ok(Json(json!({
        "success": true,
        "settled_count": settled_count,
        "message": format!("Settled {} bets", settled_count),
    })))
}

pub async fn admin_settle_bet(
    State(services): State<AppServices>,
    Path(bet_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SettleBetRequest>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&headers, &services.admin_token)?;

    let forced = match request.result.as_deref() {
        Some("won") => Some(true),
        Some("lost") => Some(false),
        Some(other) => {
            return Err(wager_error(&WagerError::InvalidRequest(format!(
                "result must be 'won' or 'lost', got '{}'",
                other
            ))))
        }
        None => None,
    };

    let now = Utc::now();
    let mut state = services.state.lock().unwrap();
    let AppState {
        bank,
        wagers,
        settlement,
        ..
    } = &mut *state;

    let wager = settlement
        .settle_one(wagers, bank, &bet_id, forced, now)
        .map_err(|e| wager_error(&e))?;

    Ok(Json(json!({
        "success": true,
        "bet": wager,
        "message": format!("Bet settled as {:?}", wager.status),
    })))
}

pub async fn admin_settlement_stats(
    State(services): State<AppServices>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_admin(&headers, &services.admin_token)?;

    let state = services.state.lock().unwrap();
    Ok(Json(json!({ "success": true, "stats": settlement_stats(&state.wagers) })))
}
