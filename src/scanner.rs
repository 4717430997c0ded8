//! Periodic surebet scanning on top of an odds source.

use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::arbitrage::{detect, Opportunity, ScanParams};
use crate::error::{NotifyError, Result};
use crate::metrics;
use crate::notify::TelegramNotifier;
use crate::odds::{OddsSnapshot, OddsSource};

/// Outcome of one scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Ranked opportunities after filtering and truncation.
    pub opportunities: Vec<Opportunity>,
    /// Events in the snapshot.
    pub events_considered: usize,
    /// Events that passed the sport and date filters.
    pub evaluated: usize,
    /// Surebets found before the ROI filter and truncation.
    pub surebets: usize,
    /// Events skipped because of bad data.
    pub skipped: usize,
    /// Sports whose fetch failed.
    pub failed_sports: Vec<String>,
    /// When the underlying odds were fetched.
    pub fetched_at: OffsetDateTime,
    /// Snapshot the scan ran on.
    pub snapshot: OddsSnapshot,
}

impl ScanReport {
    /// Best opportunity, if any.
    pub fn top(&self) -> Option<&Opportunity> {
        self.opportunities.first()
    }
}

/// Runs detection over an [`OddsSource`] and optionally pushes the best result.
///
/// Scans are serialized: a caller arriving during a scan waits for it and then
/// runs its own, which will normally be served from the odds cache.
pub struct Scanner<S> {
    source: S,
    params: ScanParams,
    notifier: Option<TelegramNotifier>,
    scan_lock: Mutex<()>,
    last_notified: Mutex<Option<String>>,
}

impl<S: OddsSource> Scanner<S> {
    /// Create a scanner without notifications.
    pub fn new(source: S, params: ScanParams) -> Self {
        Self {
            source,
            params,
            notifier: None,
            scan_lock: Mutex::new(()),
            last_notified: Mutex::new(None),
        }
    }

    /// Attach a notifier.
    pub fn with_notifier(mut self, notifier: Option<TelegramNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Default scan parameters.
    pub fn params(&self) -> &ScanParams {
        &self.params
    }

    /// Whether a notifier is attached.
    pub fn has_notifier(&self) -> bool {
        self.notifier.is_some()
    }

    /// Odds source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Scan with the default parameters.
    pub async fn scan(&self) -> Result<ScanReport> {
        self.scan_with(&self.params).await
    }

    /// Scan with explicit parameters.
    #[instrument(skip_all)]
    pub async fn scan_with(&self, params: &ScanParams) -> Result<ScanReport> {
        let _guard = self.scan_lock.lock().await;
        let _timer = metrics::timer_scan();
        metrics::inc_scans();

        let snapshot = self.source.snapshot().await?;
        let detection = detect(&snapshot.events, params, OffsetDateTime::now_utc())?;

        metrics::add_surebets_detected(detection.surebets);
        for skipped in &detection.skipped {
            metrics::inc_events_skipped(skipped.error.reason());
        }

        info!(
            events = snapshot.len(),
            evaluated = detection.evaluated,
            surebets = detection.surebets,
            returned = detection.opportunities.len(),
            skipped = detection.skipped.len(),
            "Scan complete"
        );

        Ok(ScanReport {
            events_considered: snapshot.len(),
            evaluated: detection.evaluated,
            surebets: detection.surebets,
            skipped: detection.skipped.len(),
            failed_sports: snapshot.failed_sports.clone(),
            fetched_at: snapshot.fetched_at,
            opportunities: detection.opportunities,
            snapshot,
        })
    }

    /// Push the report's best opportunity unless it was the last one sent.
    ///
    /// Returns whether a message went out. A failed send is not remembered,
    /// so the next cycle retries it.
    pub async fn notify_top(&self, report: &ScanReport) -> Result<bool> {
        let notifier = self.notifier.as_ref().ok_or(NotifyError::NotConfigured)?;
        let Some(top) = report.top() else {
            return Ok(false);
        };

        let mut last = self.last_notified.lock().await;
        if !is_new_top(last.as_deref(), top) {
            debug!(key = %top.key(), "Top opportunity already sent");
            return Ok(false);
        }

        match notifier.notify(top).await {
            Ok(()) => {
                metrics::inc_notifications_sent();
                *last = Some(top.key());
                Ok(true)
            }
            Err(e) => {
                metrics::inc_notifications_failed();
                Err(e.into())
            }
        }
    }
}

/// Whether `top` differs from the last opportunity sent.
pub fn is_new_top(last_key: Option<&str>, top: &Opportunity) -> bool {
    last_key != Some(top.key().as_str())
}
