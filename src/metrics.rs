//! Prometheus metrics for scans, odds fetches and notifications.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Odds fetch latency metric name.
pub const METRIC_ODDS_FETCH_LATENCY: &str = "odds_fetch_latency_ms";
/// Scan latency metric name.
pub const METRIC_SCAN_LATENCY: &str = "scan_latency_ms";
/// Scans counter metric name.
pub const METRIC_SCANS: &str = "scans_total";
/// Odds fetches counter metric name.
pub const METRIC_ODDS_FETCHES: &str = "odds_fetches_total";
/// Odds fetch failures counter metric name.
pub const METRIC_ODDS_FETCH_FAILURES: &str = "odds_fetch_failures_total";
/// Cache hits counter metric name.
pub const METRIC_CACHE_HITS: &str = "odds_cache_hits_total";
/// Cache misses counter metric name.
pub const METRIC_CACHE_MISSES: &str = "odds_cache_misses_total";
/// Surebets detected counter metric name.
pub const METRIC_SUREBETS_DETECTED: &str = "surebets_detected_total";
/// Skipped events counter metric name.
pub const METRIC_EVENTS_SKIPPED: &str = "events_skipped_total";
/// Notifications sent counter metric name.
pub const METRIC_NOTIFICATIONS_SENT: &str = "notifications_sent_total";
/// Notifications failed counter metric name.
pub const METRIC_NOTIFICATIONS_FAILED: &str = "notifications_failed_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_ODDS_FETCH_LATENCY,
        "Odds API request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_SCAN_LATENCY,
        "Time to fetch odds and detect surebets in milliseconds"
    );

    describe_counter!(METRIC_SCANS, "Total number of scans run");
    describe_counter!(METRIC_ODDS_FETCHES, "Total number of odds API requests");
    describe_counter!(
        METRIC_ODDS_FETCH_FAILURES,
        "Total number of odds API requests that failed"
    );
    describe_counter!(METRIC_CACHE_HITS, "Odds snapshot cache hits");
    describe_counter!(METRIC_CACHE_MISSES, "Odds snapshot cache misses");
    describe_counter!(
        METRIC_SUREBETS_DETECTED,
        "Total number of surebets detected"
    );
    describe_counter!(
        METRIC_EVENTS_SKIPPED,
        "Events skipped because of bad or insufficient data"
    );
    describe_counter!(
        METRIC_NOTIFICATIONS_SENT,
        "Total number of notifications delivered"
    );
    describe_counter!(
        METRIC_NOTIFICATIONS_FAILED,
        "Total number of notifications that failed"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record odds fetch latency.
pub fn record_odds_fetch_latency(start: Instant, sport: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_ODDS_FETCH_LATENCY, "sport" => sport.to_string()).record(latency_ms);
}

/// Increment odds fetches counter.
pub fn inc_odds_fetches() {
    counter!(METRIC_ODDS_FETCHES).increment(1);
}

/// Increment odds fetch failures counter.
pub fn inc_odds_fetch_failures(sport: &str) {
    counter!(METRIC_ODDS_FETCH_FAILURES, "sport" => sport.to_string()).increment(1);
}

/// Increment cache hits counter.
pub fn inc_cache_hits() {
    counter!(METRIC_CACHE_HITS).increment(1);
}

/// Increment cache misses counter.
pub fn inc_cache_misses() {
    counter!(METRIC_CACHE_MISSES).increment(1);
}

/// Increment scans counter.
pub fn inc_scans() {
    counter!(METRIC_SCANS).increment(1);
}

/// Add to surebets detected counter.
pub fn add_surebets_detected(count: usize) {
    counter!(METRIC_SUREBETS_DETECTED).increment(count as u64);
}

/// Increment skipped events counter.
pub fn inc_events_skipped(reason: &'static str) {
    counter!(METRIC_EVENTS_SKIPPED, "reason" => reason).increment(1);
}

/// Increment notifications sent counter.
pub fn inc_notifications_sent() {
    counter!(METRIC_NOTIFICATIONS_SENT).increment(1);
}

/// Increment notifications failed counter.
pub fn inc_notifications_failed() {
    counter!(METRIC_NOTIFICATIONS_FAILED).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for a full scan.
pub fn timer_scan() -> LatencyTimer {
    LatencyTimer::new(METRIC_SCAN_LATENCY)
}
