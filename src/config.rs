// Environment-driven configuration. Call `dotenv().ok()` before
// `Config::from_env()` so a local .env file is honored.

use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to
    pub port: u16,
    /// The Odds API key; unset means the seed catalog serves all markets
    pub odds_api_key: Option<String>,
    pub odds_api_base: String,
    /// Market cache time-to-live, seconds
    pub odds_refresh_secs: u64,
    /// Timeout for odds feed and analysis provider calls, seconds
    pub provider_timeout_secs: u64,
    /// Settlement sweep interval, seconds
    pub settle_interval_secs: u64,
    /// Payout fee for wagers matching a Rob suggestion, percent
    pub rob_fee_percentage: f64,
    /// External betting-analysis endpoint; unset means favorites-only picks
    pub rob_analysis_url: Option<String>,
    /// Shared secret for the admin settlement endpoints; unset disables them
    pub admin_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", 3000),
            odds_api_key: env_opt("ODDS_API_KEY"),
            odds_api_base: std::env::var("ODDS_API_BASE")
                .unwrap_or_else(|_| "https://api.the-odds-api.com/v4".to_string()),
            odds_refresh_secs: env_parse("ODDS_REFRESH_SECS", 300),
            provider_timeout_secs: env_parse(
                "PROVIDER_TIMEOUT_SECS",
                crate::catalog::provider::DEFAULT_TIMEOUT_SECS,
            ),
            settle_interval_secs: env_parse("SETTLE_INTERVAL_SECS", 300),
            rob_fee_percentage: env_parse("ROB_FEE_PERCENTAGE", crate::rob::ROB_FEE_PERCENTAGE),
            rob_analysis_url: env_opt("ROB_ANALYSIS_URL"),
            admin_token: env_opt("ADMIN_TOKEN"),
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
