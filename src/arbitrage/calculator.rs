//! Surebet math: inverse-odds sum, ROI and stake allocation.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use time::OffsetDateTime;

use super::aggregator::BestPrice;
use crate::error::ArbitrageError;
use crate::odds::{Event, Side};

/// Decimal places ROI is rounded to (for display and threshold checks).
pub const ROI_DECIMALS: u32 = 2;

/// Upper bound on the stake rounding precision.
pub const MAX_STAKE_PRECISION: u32 = 8;

/// Largest accepted total stake.
pub const MAX_TOTAL_STAKE: Decimal = dec!(1000000000);

/// Stake split for a two-way surebet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakePlan {
    /// Odds for outcome A.
    pub odds_a: Decimal,
    /// Odds for outcome B.
    pub odds_b: Decimal,
    /// `1/odds_a + 1/odds_b`, strictly below one.
    pub inverse_sum: Decimal,
    /// Guaranteed return in percent, rounded to [`ROI_DECIMALS`].
    pub roi: Decimal,
    /// Total amount staked.
    pub total_stake: Decimal,
    /// Stake on outcome A, rounded to the stake precision.
    pub stake_a: Decimal,
    /// Stake on outcome B, always `total_stake - stake_a`.
    pub stake_b: Decimal,
    /// Expected profit, `total_stake * roi / 100`.
    pub profit: Decimal,
}

impl StakePlan {
    /// Return if outcome A wins.
    pub fn payout_a(&self) -> Decimal {
        self.stake_a.saturating_mul(self.odds_a)
    }

    /// Return if outcome B wins.
    pub fn payout_b(&self) -> Decimal {
        self.stake_b.saturating_mul(self.odds_b)
    }

    /// Absolute difference between the two payouts (rounding residue).
    pub fn payout_spread(&self) -> Decimal {
        (self.payout_a() - self.payout_b()).abs()
    }
}

/// Result of the arbitrage test for one pair of odds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbitrageCheck {
    /// The pair is a surebet.
    Surebet(StakePlan),
    /// Implied probabilities sum to one or more.
    NoOpportunity {
        /// The computed inverse sum.
        inverse_sum: Decimal,
    },
}

impl ArbitrageCheck {
    /// The stake plan, if this is a surebet.
    pub fn surebet(self) -> Option<StakePlan> {
        match self {
            ArbitrageCheck::Surebet(plan) => Some(plan),
            ArbitrageCheck::NoOpportunity { .. } => None,
        }
    }
}

/// Reject odds that are not strictly greater than 1.0.
pub fn validate_odds(odds: Decimal) -> Result<Decimal, ArbitrageError> {
    if odds > Decimal::ONE {
        Ok(odds)
    } else {
        Err(ArbitrageError::InvalidOdds { odds })
    }
}

/// Reject a total stake that is not strictly positive, exceeds
/// [`MAX_TOTAL_STAKE`] or has more decimals than `stake_precision`.
pub fn validate_stake(total_stake: Decimal, stake_precision: u32) -> Result<Decimal, ArbitrageError> {
    if total_stake <= Decimal::ZERO
        || total_stake > MAX_TOTAL_STAKE
        || total_stake.normalize().scale() > stake_precision
    {
        return Err(ArbitrageError::InvalidStake(total_stake));
    }
    Ok(total_stake)
}

/// Reject a stake precision above [`MAX_STAKE_PRECISION`].
pub fn validate_precision(stake_precision: u32) -> Result<u32, ArbitrageError> {
    if stake_precision > MAX_STAKE_PRECISION {
        return Err(ArbitrageError::InvalidParameter(format!(
            "stake precision {} exceeds {}",
            stake_precision, MAX_STAKE_PRECISION
        )));
    }
    Ok(stake_precision)
}

/// Implied probability sum `1/odds_a + 1/odds_b`.
pub fn inverse_sum(odds_a: Decimal, odds_b: Decimal) -> Decimal {
    Decimal::ONE / odds_a + Decimal::ONE / odds_b
}

/// ROI in percent for an inverse sum, rounded to [`ROI_DECIMALS`].
pub fn roi_from_inverse_sum(inverse_sum: Decimal) -> Result<Decimal, ArbitrageError> {
    let roi = Decimal::ONE
        .checked_div(inverse_sum)
        .and_then(|gross| (gross - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(ArbitrageError::Overflow("roi"))?;
    Ok(roi.round_dp_with_strategy(ROI_DECIMALS, RoundingStrategy::MidpointAwayFromZero))
}

/// Run the arbitrage test and, for a surebet, split `total_stake` across both outcomes.
///
/// Leg A is rounded to `stake_precision` decimals and leg B is the remainder, so
/// `stake_a + stake_b == total_stake` exactly. A boundary inverse sum of exactly
/// one is not a surebet. Arithmetic that would overflow is reported as
/// [`ArbitrageError::Overflow`] instead of panicking.
pub fn calculate(
    odds_a: Decimal,
    odds_b: Decimal,
    total_stake: Decimal,
    stake_precision: u32,
) -> Result<ArbitrageCheck, ArbitrageError> {
    let stake_precision = validate_precision(stake_precision)?;
    let total_stake = validate_stake(total_stake, stake_precision)?;
    let odds_a = validate_odds(odds_a)?;
    let odds_b = validate_odds(odds_b)?;

    let inverse_sum = inverse_sum(odds_a, odds_b);
    if inverse_sum >= Decimal::ONE {
        return Ok(ArbitrageCheck::NoOpportunity { inverse_sum });
    }

    let roi = roi_from_inverse_sum(inverse_sum)?;
    let stake_a = total_stake
        .checked_mul(Decimal::ONE / odds_a)
        .and_then(|weighted| weighted.checked_div(inverse_sum))
        .ok_or(ArbitrageError::Overflow("stake"))?
        .round_dp_with_strategy(stake_precision, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, total_stake);
    let stake_b = total_stake - stake_a;
    let profit = total_stake
        .checked_mul(roi)
        .ok_or(ArbitrageError::Overflow("profit"))?
        / Decimal::ONE_HUNDRED;
    let profit = profit.round_dp_with_strategy(stake_precision, RoundingStrategy::MidpointAwayFromZero);

    if stake_a.checked_mul(odds_a).is_none() || stake_b.checked_mul(odds_b).is_none() {
        return Err(ArbitrageError::Overflow("payout"));
    }

    Ok(ArbitrageCheck::Surebet(StakePlan {
        odds_a,
        odds_b,
        inverse_sum,
        roi,
        total_stake,
        stake_a,
        stake_b,
        profit,
    }))
}

/// Event fields carried along with an opportunity for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSummary {
    /// Event identifier.
    pub id: String,
    /// Sport key.
    pub sport_key: String,
    /// Sport title.
    pub sport_title: String,
    /// Outcome A label.
    pub home: String,
    /// Outcome B label.
    pub away: String,
    /// Scheduled start, UTC.
    pub commence_time: OffsetDateTime,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            sport_key: event.sport_key.clone(),
            sport_title: event.sport_title.clone(),
            home: event.home.clone(),
            away: event.away.clone(),
            commence_time: event.commence_time,
        }
    }
}

/// One side of a surebet.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    /// Side of the event.
    pub side: Side,
    /// Outcome label.
    pub outcome: String,
    /// Bookmaker key.
    pub bookmaker: String,
    /// Bookmaker display name.
    pub bookmaker_title: String,
    /// Bookmaker page for the event, if known.
    pub link: Option<String>,
    /// Best decimal odds.
    pub odds: Decimal,
    /// Amount to stake on this leg.
    pub stake: Decimal,
}

impl Leg {
    /// Return if this leg wins.
    pub fn payout(&self) -> Decimal {
        self.stake.saturating_mul(self.odds)
    }

    fn new(price: &BestPrice, stake: Decimal) -> Self {
        Self {
            side: price.side,
            outcome: price.outcome.clone(),
            bookmaker: price.bookmaker.key.clone(),
            bookmaker_title: price.bookmaker.title.clone(),
            link: price.bookmaker.link.clone(),
            odds: price.odds,
            stake,
        }
    }
}

/// Detected surebet for an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    /// The event.
    pub event: EventSummary,
    /// Outcome A leg.
    pub home: Leg,
    /// Outcome B leg.
    pub away: Leg,
    /// Implied probability sum.
    pub inverse_sum: Decimal,
    /// Guaranteed return in percent.
    pub roi: Decimal,
    /// Total amount staked across both legs.
    pub total_stake: Decimal,
    /// Expected profit.
    pub profit: Decimal,
    /// Timestamp when the opportunity was computed.
    pub detected_at: OffsetDateTime,
}

impl Opportunity {
    /// Assemble an opportunity from the chosen prices and their stake plan.
    pub fn new(
        event: &Event,
        home: &BestPrice,
        away: &BestPrice,
        plan: &StakePlan,
        detected_at: OffsetDateTime,
    ) -> Self {
        Self {
            event: EventSummary::from(event),
            home: Leg::new(home, plan.stake_a),
            away: Leg::new(away, plan.stake_b),
            inverse_sum: plan.inverse_sum,
            roi: plan.roi,
            total_stake: plan.total_stake,
            profit: plan.profit,
            detected_at,
        }
    }

    /// Both legs, home first.
    pub fn legs(&self) -> [&Leg; 2] {
        [&self.home, &self.away]
    }

    /// Identity of the bet (event, bookmakers, odds), ignoring detection time.
    pub fn key(&self) -> String {
        format!(
            "{}|{}@{}|{}@{}",
            self.event.id, self.home.bookmaker, self.home.odds, self.away.bookmaker, self.away.odds
        )
    }
}
