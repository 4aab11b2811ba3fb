// Payday simulated sportsbook - Main Entry Point

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};
use tower_http::cors::{Any, CorsLayer};

use payday_sportsbook::app_state::{AppServices, AppState, SharedState};
use payday_sportsbook::catalog::{MarketCatalog, OddsApiClient};
use payday_sportsbook::config::Config;
use payday_sportsbook::handlers::*;
use payday_sportsbook::rob::RobAnalyst;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    if config.odds_api_key.is_none() {
        tracing::warn!("ODDS_API_KEY not set, serving seed markets only");
    }
    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set, admin endpoints disabled");
    }

    let state: SharedState = Arc::new(Mutex::new(AppState::new()));

    let odds_client = OddsApiClient::new(
        config.odds_api_key.clone(),
        config.odds_api_base.clone(),
        Duration::from_secs(config.provider_timeout_secs),
    );
    let catalog = Arc::new(MarketCatalog::new(
        odds_client,
        ChronoDuration::seconds(config.odds_refresh_secs as i64),
    ));
    let analyst = Arc::new(RobAnalyst::new(
        config.rob_analysis_url.clone(),
        Duration::from_secs(config.provider_timeout_secs),
    ));

    let services = AppServices {
        state,
        catalog,
        analyst,
        rob_fee_percentage: config.rob_fee_percentage,
        admin_token: config.admin_token.clone(),
    };

    // Recurring settlement sweep. First run is delayed a little so startup
    // traffic (initial odds fetch) settles first.
    let sweep_services = services.clone();
    let sweep_interval = Duration::from_secs(config.settle_interval_secs);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        run_sweep(&sweep_services);

        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            run_sweep(&sweep_services);
        }
    });

    let app = Router::new()
        // ===== HEALTH =====
        .route("/api/health", get(health_check))
        // ===== MARKET ENDPOINTS =====
        .route("/api/markets", get(get_markets))
        // ===== WALLET ENDPOINTS =====
        .route("/api/users/:user_id/balance", get(get_balance))
        .route("/api/users/:user_id/deposit", post(deposit))
        // ===== BETTING ENDPOINTS =====
        .route("/api/bets", post(place_bets))
        .route("/api/bets", get(get_bets))
        .route("/api/bets/:bet_id/cancel", post(cancel_bet))
        // ===== ROB ENDPOINTS =====
        .route("/api/rob/suggestions", get(get_suggestions))
        .route("/api/rob/suggest", post(create_suggestion))
        // ===== ADMIN ENDPOINTS =====
        .route("/api/admin/settle-bets", post(admin_settle_all))
        .route("/api/admin/settle-bet/:bet_id", post(admin_settle_bet))
        .route("/api/admin/settlement-stats", get(admin_settlement_stats))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(services);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Payday sportsbook listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind server port");
    axum::serve(listener, app).await.expect("server error");
}

fn run_sweep(services: &AppServices) {
    let now = Utc::now();
    let mut state = services.state.lock().unwrap();
    let AppState {
        bank,
        wagers,
        settlement,
        ..
    } = &mut *state;
    settlement.sweep(wagers, bank, now);
}
