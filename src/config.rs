//! Application configuration loaded from environment variables.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::arbitrage::{
    BookmakerFilter, FallbackPolicy, OpportunityFilter, RankOrder, ScanParams, MAX_DAYS_WINDOW,
};
use crate::arbitrage::calculator::{validate_stake, MAX_STAKE_PRECISION, MAX_TOTAL_STAKE};
use crate::error::{Result, SurebetError};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Odds Source ===
    /// The Odds API key.
    pub the_odds_api_key: String,

    /// The Odds API base URL.
    #[serde(default = "default_odds_api_url")]
    pub odds_api_url: String,

    /// Sport keys to scan (comma separated).
    #[serde(default = "default_sports")]
    pub sports: Vec<String>,

    /// Bookmaker regions to request (comma separated).
    #[serde(default = "default_regions")]
    pub regions: Vec<String>,

    /// Snapshot cache time-to-live in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    // === Surebet Parameters ===
    /// Bookmakers tolerant of arbitrage betting. Empty means all.
    #[serde(default = "default_friendly_bookmakers")]
    pub friendly_bookmakers: Vec<String>,

    /// Fall back to every bookmaker when fewer than two friendly ones quote an event.
    #[serde(default)]
    pub bookmaker_fallback: bool,

    /// Total stake split across both legs.
    #[serde(default = "default_total_stake")]
    pub total_stake: Decimal,

    /// Decimal places for stakes.
    #[serde(default = "default_stake_precision")]
    pub stake_precision: u32,

    /// Minimum ROI in percent.
    #[serde(default = "default_min_roi")]
    pub min_roi: Decimal,

    /// Look-ahead window in days.
    #[serde(default = "default_days_window")]
    pub days_window: u32,

    /// Maximum opportunities per query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Result ordering.
    #[serde(default)]
    pub rank_order: RankOrder,

    // === Scheduling ===
    /// Seconds between background scans.
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval: u64,

    // === Telegram ===
    /// Bot token for push notifications.
    #[serde(default)]
    pub telegram_bot_token: Option<String>,

    /// Chat id for push notifications.
    #[serde(default)]
    pub telegram_chat_id: Option<String>,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_odds_api_url() -> String {
    "https://api.the-odds-api.com/v4".to_string()
}

fn default_sports() -> Vec<String> {
    [
        "basketball_nba",
        "basketball_euroleague",
        "baseball_mlb",
        "mma_mixed_martial_arts",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_regions() -> Vec<String> {
    vec!["eu".to_string()]
}

fn default_cache_ttl() -> u64 {
    30
}

fn default_http_timeout() -> u64 {
    10_000
}

fn default_friendly_bookmakers() -> Vec<String> {
    ["pinnacle", "betfair_ex_eu", "smarkets"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_total_stake() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn default_stake_precision() -> u32 {
    2
}

fn default_min_roi() -> Decimal {
    Decimal::ONE
}

fn default_days_window() -> u32 {
    7
}

fn default_max_results() -> usize {
    5
}

fn default_fetch_interval() -> u64 {
    300
}

fn default_port() -> u16 {
    10000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Load configuration and reject invalid values.
    pub fn load_validated() -> Result<Self> {
        let config = Self::load()?;
        config.validate().map_err(SurebetError::InvalidConfig)?;
        Ok(config)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.the_odds_api_key.trim().is_empty() {
            return Err("THE_ODDS_API_KEY is required".to_string());
        }

        if self.sports.is_empty() {
            return Err("SPORTS must list at least one sport key".to_string());
        }

        if self.stake_precision > MAX_STAKE_PRECISION {
            return Err(format!(
                "STAKE_PRECISION must be at most {}",
                MAX_STAKE_PRECISION
            ));
        }

        if validate_stake(self.total_stake, self.stake_precision).is_err() {
            return Err(format!(
                "TOTAL_STAKE must be greater than 0, at most {} and have at most STAKE_PRECISION decimals",
                MAX_TOTAL_STAKE
            ));
        }

        if self.days_window == 0 || self.days_window > MAX_DAYS_WINDOW {
            return Err(format!("DAYS_WINDOW must be between 1 and {}", MAX_DAYS_WINDOW));
        }

        if self.fetch_interval == 0 {
            return Err("FETCH_INTERVAL must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Whether Telegram push notifications are configured.
    pub fn telegram_enabled(&self) -> bool {
        matches!(
            (&self.telegram_bot_token, &self.telegram_chat_id),
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty()
        )
    }

    /// Bookmaker filter from the friendly list and fallback flag.
    pub fn bookmaker_filter(&self) -> BookmakerFilter {
        let fallback = if self.bookmaker_fallback {
            FallbackPolicy::UseAll
        } else {
            FallbackPolicy::Skip
        };
        BookmakerFilter::allow_list(self.friendly_bookmakers.clone(), fallback)
    }

    /// Engine parameters for scans.
    pub fn scan_params(&self) -> ScanParams {
        ScanParams {
            total_stake: self.total_stake,
            stake_precision: self.stake_precision,
            bookmakers: self.bookmaker_filter(),
            filter: OpportunityFilter {
                min_roi: Some(self.min_roi),
                sports: None,
                days_window: Some(self.days_window),
            },
            order: self.rank_order,
            max_results: Some(self.max_results),
        }
    }

    /// Snapshot cache time-to-live.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Interval between background scans.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        the_odds_api_key: "test-key".to_string(),
        odds_api_url: "http://127.0.0.1:9".to_string(),
        sports: default_sports(),
        regions: default_regions(),
        cache_ttl_seconds: default_cache_ttl(),
        http_timeout_ms: 500,
        friendly_bookmakers: default_friendly_bookmakers(),
        bookmaker_fallback: false,
        total_stake: default_total_stake(),
        stake_precision: default_stake_precision(),
        min_roi: default_min_roi(),
        days_window: default_days_window(),
        max_results: default_max_results(),
        rank_order: RankOrder::default(),
        fetch_interval: default_fetch_interval(),
        telegram_bot_token: None,
        telegram_chat_id: None,
        port: default_port(),
        rust_log: default_log_level(),
        verbose: false,
    }
}
