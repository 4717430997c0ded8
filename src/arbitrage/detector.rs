//! Surebet detection across a batch of events.

use rust_decimal::Decimal;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info, instrument, warn};

use super::aggregator::{best_prices, BookmakerFilter};
use super::calculator::{calculate, validate_precision, validate_stake, ArbitrageCheck, Opportunity};
use super::ranking::{rank, OpportunityFilter, RankOrder};
use crate::error::ArbitrageError;
use crate::odds::Event;

/// Parameters for one detection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanParams {
    /// Amount split across the two legs of every opportunity.
    pub total_stake: Decimal,
    /// Decimal places stakes are rounded to (2 = cents).
    pub stake_precision: u32,
    /// Which bookmakers may supply prices.
    pub bookmakers: BookmakerFilter,
    /// ROI, sport and start-time filters.
    pub filter: OpportunityFilter,
    /// Ordering of the result list.
    pub order: RankOrder,
    /// Maximum number of opportunities returned.
    pub max_results: Option<usize>,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            total_stake: Decimal::ONE_HUNDRED,
            stake_precision: 2,
            bookmakers: BookmakerFilter::All,
            filter: OpportunityFilter::default(),
            order: RankOrder::default(),
            max_results: None,
        }
    }
}

impl ScanParams {
    /// Parameters with stake, minimum ROI, day window and result limit set.
    pub fn new(total_stake: Decimal, min_roi: Decimal, days_window: u32, max_results: usize) -> Self {
        Self {
            total_stake,
            filter: OpportunityFilter {
                min_roi: Some(min_roi),
                sports: None,
                days_window: Some(days_window),
            },
            max_results: Some(max_results),
            ..Default::default()
        }
    }

    /// Restrict to sports matching any of the given names.
    pub fn with_sports(mut self, sports: Vec<String>) -> Self {
        self.filter.sports = Some(sports);
        self
    }

    /// Set the bookmaker filter.
    pub fn with_bookmakers(mut self, bookmakers: BookmakerFilter) -> Self {
        self.bookmakers = bookmakers;
        self
    }

    /// Set the ranking order.
    pub fn with_order(mut self, order: RankOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the stake rounding precision.
    pub fn with_stake_precision(mut self, precision: u32) -> Self {
        self.stake_precision = precision;
        self
    }

    /// Check call-level parameters.
    pub fn validate(&self) -> Result<(), ArbitrageError> {
        validate_precision(self.stake_precision)?;
        validate_stake(self.total_stake, self.stake_precision)?;
        Ok(())
    }
}

/// An event left out of a run, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEvent {
    /// Event identifier.
    pub event_id: String,
    /// Why it was skipped.
    pub error: ArbitrageError,
}

/// Full output of a detection run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    /// Ranked and truncated opportunities.
    pub opportunities: Vec<Opportunity>,
    /// Events that passed the filters and were priced.
    pub evaluated: usize,
    /// Surebets found before the ROI filter and truncation.
    pub surebets: usize,
    /// Events skipped because of bad data.
    pub skipped: Vec<SkippedEvent>,
}

/// Find, filter and rank surebets as of the current time.
pub fn find_opportunities(
    events: &[Event],
    params: &ScanParams,
) -> Result<Vec<Opportunity>, ArbitrageError> {
    find_opportunities_on(events, params, OffsetDateTime::now_utc())
}

/// Same as [`find_opportunities`] with an explicit "now".
///
/// `now` fixes both the start window (its UTC date is "today") and the
/// `detected_at` stamp, so equal inputs give equal outputs.
pub fn find_opportunities_on(
    events: &[Event],
    params: &ScanParams,
    now: OffsetDateTime,
) -> Result<Vec<Opportunity>, ArbitrageError> {
    detect(events, params, now).map(|d| d.opportunities)
}

/// Run detection and report skipped events alongside the results.
///
/// Bad data in one event only skips that event. Invalid call parameters fail
/// the whole run. An empty input yields an empty result.
#[instrument(skip_all, fields(events = events.len(), now = %now))]
pub fn detect(
    events: &[Event],
    params: &ScanParams,
    now: OffsetDateTime,
) -> Result<Detection, ArbitrageError> {
    params.validate()?;
    let today = now.to_offset(UtcOffset::UTC).date();

    let mut detection = Detection::default();
    let mut accepted = Vec::new();

    for event in events.iter().filter(|e| params.filter.accepts_event(e, today)) {
        detection.evaluated += 1;

        match evaluate_event(event, params, now) {
            Ok(Some(opportunity)) => {
                detection.surebets += 1;
                if params.filter.accepts_roi(opportunity.roi) {
                    info!(
                        event = %event.id,
                        home = %event.home,
                        away = %event.away,
                        roi = %opportunity.roi,
                        "Surebet detected"
                    );
                    accepted.push(opportunity);
                } else {
                    debug!(event = %event.id, roi = %opportunity.roi, "Surebet below minimum ROI");
                }
            }
            Ok(None) => {}
            Err(error) if error.is_per_event() => {
                warn!(event = %event.id, reason = error.reason(), error = %error, "Skipping event");
                detection.skipped.push(SkippedEvent {
                    event_id: event.id.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    detection.opportunities = rank(accepted, params.order, params.max_results);
    Ok(detection)
}

/// Price a single event and test it for a surebet.
pub fn evaluate_event(
    event: &Event,
    params: &ScanParams,
    detected_at: OffsetDateTime,
) -> Result<Option<Opportunity>, ArbitrageError> {
    let prices = best_prices(event, &params.bookmakers)?;
    let Some((home, away)) = prices.pair() else {
        debug!(event = %event.id, sides = prices.len(), "Event not quoted on both sides");
        return Ok(None);
    };

    match calculate(home.odds, away.odds, params.total_stake, params.stake_precision)? {
        ArbitrageCheck::Surebet(plan) => {
            Ok(Some(Opportunity::new(event, home, away, &plan, detected_at)))
        }
        ArbitrageCheck::NoOpportunity { inverse_sum } => {
            debug!(
                event = %event.id,
                home_odds = %home.odds,
                away_odds = %away.odds,
                inverse_sum = %inverse_sum.round_dp(4),
                "No arbitrage"
            );
            Ok(None)
        }
    }
}
