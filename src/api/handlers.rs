//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;

use crate::arbitrage::{find_opportunities, Leg, Opportunity, ScanParams};
use crate::odds::OddsSnapshot;
use crate::scanner::ScanReport;
use crate::utils::split_list;

/// Scan bookkeeping exposed by `/api/v1/status`.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Successful scans.
    pub scans: u64,
    /// Failed scans.
    pub failures: u64,
    /// Opportunities in the last successful scan.
    pub last_opportunities: usize,
    /// When the last successful scan finished.
    pub last_scan_at: Option<OffsetDateTime>,
    /// Error of the most recent failed scan, cleared on success.
    pub last_error: Option<String>,
}

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether a snapshot has been loaded.
    pub ready: Arc<AtomicBool>,
    /// Latest odds snapshot.
    pub snapshot: Arc<RwLock<Option<OddsSnapshot>>>,
    /// Scan statistics.
    pub stats: Arc<RwLock<ScanStats>>,
    /// Default query parameters.
    pub params: Arc<ScanParams>,
    /// Prometheus renderer, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state with default query parameters.
    pub fn new(params: ScanParams) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            snapshot: Arc::new(RwLock::new(None)),
            stats: Arc::new(RwLock::new(ScanStats::default())),
            params: Arc::new(params),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Store the snapshot and counters of a successful scan.
    pub async fn record_scan(&self, report: &ScanReport) {
        *self.snapshot.write().await = Some(report.snapshot.clone());

        let mut stats = self.stats.write().await;
        stats.scans += 1;
        stats.last_opportunities = report.opportunities.len();
        stats.last_scan_at = Some(OffsetDateTime::now_utc());
        stats.last_error = None;
        drop(stats);

        self.set_ready(true);
    }

    /// Record a failed scan. The previous snapshot stays in place.
    pub async fn record_failure(&self, error: &str) {
        let mut stats = self.stats.write().await;
        stats.failures += 1;
        stats.last_error = Some(error.to_string());
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether a snapshot is loaded.
    pub ready: bool,
    /// Events in the current snapshot.
    pub events: usize,
    /// When the snapshot was fetched.
    pub fetched_at: Option<String>,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// Successful scans.
    pub scans: u64,
    /// Failed scans.
    pub failures: u64,
    /// Opportunities found by the last scan.
    pub last_opportunities: usize,
    /// Time of the last successful scan.
    pub last_scan_at: Option<String>,
    /// Most recent scan error.
    pub last_error: Option<String>,
}

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Query overrides for `/api/v1/surebets`.
#[derive(Debug, Default, Deserialize)]
pub struct SurebetQuery {
    /// Comma-separated sport names or keys.
    pub sport: Option<String>,
    /// Minimum ROI in percent.
    pub min_roi: Option<Decimal>,
    /// Look-ahead window in days.
    pub days: Option<u32>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Total stake.
    pub stake: Option<Decimal>,
}

impl SurebetQuery {
    /// Apply the overrides on top of `base`.
    pub fn apply(&self, base: &ScanParams) -> ScanParams {
        let mut params = base.clone();

        if let Some(sport) = &self.sport {
            let sports = split_list(sport);
            if !sports.is_empty() {
                params = params.with_sports(sports);
            }
        }
        if let Some(min_roi) = self.min_roi {
            params.filter.min_roi = Some(min_roi);
        }
        if let Some(days) = self.days {
            params.filter.days_window = Some(days);
        }
        if let Some(limit) = self.limit {
            params.max_results = Some(limit);
        }
        if let Some(stake) = self.stake {
            params.total_stake = stake;
        }
        params
    }
}

/// One leg of an opportunity.
#[derive(Debug, Serialize)]
pub struct LegResponse {
    /// "home" or "away".
    pub side: String,
    /// Outcome label.
    pub outcome: String,
    /// Bookmaker key.
    pub bookmaker: String,
    /// Bookmaker display name.
    pub bookmaker_title: String,
    /// Bookmaker page for the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Decimal odds.
    pub odds: String,
    /// Stake on this leg.
    pub stake: String,
    /// Return if this leg wins.
    pub payout: String,
}

impl From<&Leg> for LegResponse {
    fn from(leg: &Leg) -> Self {
        Self {
            side: leg.side.to_string(),
            outcome: leg.outcome.clone(),
            bookmaker: leg.bookmaker.clone(),
            bookmaker_title: leg.bookmaker_title.clone(),
            link: leg.link.clone(),
            odds: leg.odds.to_string(),
            stake: leg.stake.to_string(),
            payout: leg.payout().to_string(),
        }
    }
}

/// One surebet.
#[derive(Debug, Serialize)]
pub struct OpportunityResponse {
    /// Event id.
    pub event_id: String,
    /// Sport key.
    pub sport_key: String,
    /// Sport title.
    pub sport_title: String,
    /// Outcome A.
    pub home: String,
    /// Outcome B.
    pub away: String,
    /// Scheduled start (RFC 3339).
    pub commence_time: String,
    /// ROI in percent.
    pub roi: String,
    /// Expected profit.
    pub profit: String,
    /// Total stake.
    pub total_stake: String,
    /// Sum of inverse odds.
    pub inverse_sum: String,
    /// Both legs, home first.
    pub legs: Vec<LegResponse>,
}

impl From<&Opportunity> for OpportunityResponse {
    fn from(opportunity: &Opportunity) -> Self {
        let event = &opportunity.event;
        Self {
            event_id: event.id.clone(),
            sport_key: event.sport_key.clone(),
            sport_title: event.sport_title.clone(),
            home: event.home.clone(),
            away: event.away.clone(),
            commence_time: rfc3339(event.commence_time),
            roi: opportunity.roi.to_string(),
            profit: opportunity.profit.to_string(),
            total_stake: opportunity.total_stake.to_string(),
            inverse_sum: opportunity.inverse_sum.round_dp(6).to_string(),
            legs: opportunity.legs().into_iter().map(LegResponse::from).collect(),
        }
    }
}

/// Surebet listing.
#[derive(Debug, Serialize)]
pub struct SurebetsResponse {
    /// Events in the snapshot the query ran on.
    pub events_available: usize,
    /// When the snapshot was fetched.
    pub fetched_at: String,
    /// Sports whose fetch failed.
    pub failed_sports: Vec<String>,
    /// Number of opportunities returned.
    pub count: usize,
    /// Ranked opportunities.
    pub opportunities: Vec<OpportunityResponse>,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 once a snapshot is loaded, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let snapshot = state.snapshot.read().await;

    let response = ReadyResponse {
        ready: is_ready,
        events: snapshot.as_ref().map_or(0, OddsSnapshot::len),
        fetched_at: snapshot.as_ref().map(|s| rfc3339(s.fetched_at)),
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - returns scan statistics.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.stats.read().await;
    let status = if state.is_ready() { "running" } else { "starting" };

    Json(StatusResponse {
        status,
        scans: stats.scans,
        failures: stats.failures,
        last_opportunities: stats.last_opportunities,
        last_scan_at: stats.last_scan_at.map(rfc3339),
        last_error: stats.last_error.clone(),
    })
}

/// Surebet handler - re-runs detection on the latest snapshot with query overrides.
pub async fn surebets(
    State(state): State<AppState>,
    Query(query): Query<SurebetQuery>,
) -> Result<Json<SurebetsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(snapshot) = state.snapshot.read().await.clone() else {
        return Err(error(
            StatusCode::SERVICE_UNAVAILABLE,
            "no odds data available yet",
        ));
    };

    let params = query.apply(&state.params);
    debug!(?query, "Surebet query");

    let opportunities = find_opportunities(&snapshot.events, &params)
        .map_err(|e| error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    Ok(Json(SurebetsResponse {
        events_available: snapshot.len(),
        fetched_at: rfc3339(snapshot.fetched_at),
        failed_sports: snapshot.failed_sports.clone(),
        count: opportunities.len(),
        opportunities: opportunities.iter().map(OpportunityResponse::from).collect(),
    }))
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            "metrics recorder not installed".to_string(),
        ),
    }
}

fn error(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}
