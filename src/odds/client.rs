//! The Odds API client.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::FeedError;
use crate::metrics;

use super::types::{ApiEvent, Event, H2H_MARKET};

/// Response header carrying the remaining request quota.
const REQUESTS_REMAINING: &str = "x-requests-remaining";

/// HTTP client for the Odds API v4.
#[derive(Debug, Clone)]
pub struct OddsApiClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL, e.g. `https://api.the-odds-api.com/v4`.
    base_url: String,
    /// API key sent as the `apiKey` query parameter.
    api_key: String,
}

impl OddsApiClient {
    /// Create a client from config.
    pub fn new(config: &Config) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self::with_http(
            http,
            &config.odds_api_url,
            &config.the_odds_api_key,
        ))
    }

    /// Create a client around an existing HTTP client.
    pub fn with_http(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch head-to-head odds for one sport and normalize them.
    ///
    /// Events that cannot be normalized are logged and dropped; the rest of
    /// the sport is still returned.
    #[instrument(skip_all, fields(sport = %sport))]
    pub async fn fetch_sport(&self, sport: &str, regions: &[String]) -> Result<Vec<Event>, FeedError> {
        let url = format!("{}/sports/{}/odds", self.base_url, sport);
        let regions = regions.join(",");
        let start = Instant::now();

        metrics::inc_odds_fetches();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", regions.as_str()),
                ("markets", H2H_MARKET),
                ("oddsFormat", "decimal"),
                ("dateFormat", "iso"),
                ("includeLinks", "true"),
            ])
            .send()
            .await?;
        metrics::record_odds_fetch_latency(start, sport);

        if let Some(remaining) = response
            .headers()
            .get(REQUESTS_REMAINING)
            .and_then(|v| v.to_str().ok())
        {
            debug!(remaining, "Odds API quota");
        }

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(FeedError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(FeedError::QuotaExhausted),
            status if !status.is_success() => {
                return Err(FeedError::FetchFailed {
                    sport: sport.to_string(),
                    reason: format!("HTTP {}", status),
                });
            }
            _ => {}
        }

        let body: Vec<ApiEvent> = response
            .json()
            .await
            .map_err(|e| FeedError::ParseError(format!("{}: {}", sport, e)))?;

        Ok(normalize(body))
    }
}

/// Convert wire events, dropping the ones that fail normalization.
pub(crate) fn normalize(events: Vec<ApiEvent>) -> Vec<Event> {
    events
        .into_iter()
        .filter_map(|raw| {
            let id = raw.id.clone();
            match raw.into_event() {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(event_id = %id, error = %e, "Dropping malformed event");
                    None
                }
            }
        })
        .collect()
}
