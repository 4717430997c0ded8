//! Best-price aggregation across bookmakers.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Deserialize;
use smallvec::SmallVec;
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::error::ArbitrageError;
use crate::odds::{Bookmaker, Event, Quote, Side};

/// What to do when an allow-list leaves fewer than two bookmakers for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FallbackPolicy {
    /// Skip the event with [`ArbitrageError::InsufficientBookmakers`].
    #[default]
    Skip,
    /// Use every bookmaker quoting the event instead.
    UseAll,
}

/// Restricts which bookmakers may supply the best price.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BookmakerFilter {
    /// Every bookmaker is eligible.
    #[default]
    All,
    /// Only the listed bookmaker keys are eligible.
    AllowList {
        /// Allowed bookmaker keys.
        bookmakers: Vec<String>,
        /// Policy when the list leaves fewer than two bookmakers.
        fallback: FallbackPolicy,
    },
}

impl BookmakerFilter {
    /// Build an allow-list filter. An empty list allows every bookmaker.
    pub fn allow_list(bookmakers: Vec<String>, fallback: FallbackPolicy) -> Self {
        if bookmakers.is_empty() {
            BookmakerFilter::All
        } else {
            BookmakerFilter::AllowList {
                bookmakers,
                fallback,
            }
        }
    }

    /// Whether a bookmaker key passes the filter.
    pub fn allows(&self, key: &str) -> bool {
        match self {
            BookmakerFilter::All => true,
            BookmakerFilter::AllowList { bookmakers, .. } => {
                bookmakers.iter().any(|b| b.eq_ignore_ascii_case(key))
            }
        }
    }
}

/// Best available price for one side of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct BestPrice {
    /// Side this price is for.
    pub side: Side,
    /// Outcome label.
    pub outcome: String,
    /// Bookmaker offering the price.
    pub bookmaker: Bookmaker,
    /// Decimal odds.
    pub odds: Decimal,
}

/// Best prices for an event, ordered home then away. Holds 0, 1 or 2 entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BestPrices {
    prices: SmallVec<[BestPrice; 2]>,
}

impl BestPrices {
    /// Best price for a side, if any bookmaker quoted it.
    pub fn get(&self, side: Side) -> Option<&BestPrice> {
        self.prices.iter().find(|p| p.side == side)
    }

    /// Both legs, when both sides are quoted.
    pub fn pair(&self) -> Option<(&BestPrice, &BestPrice)> {
        Some((self.get(Side::Home)?, self.get(Side::Away)?))
    }

    /// Number of quoted sides.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether no side is quoted.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Iterate in home, away order.
    pub fn iter(&self) -> impl Iterator<Item = &BestPrice> {
        self.prices.iter()
    }
}

/// Reduce an event's quotes to the highest price per side.
///
/// Ties keep the first quote seen, so results are stable for a fixed input order.
/// Quotes tagged with another event id are ignored. Any outcome label other than
/// the event's home/away labels marks a multi-way market, which is rejected.
pub fn best_prices(event: &Event, filter: &BookmakerFilter) -> Result<BestPrices, ArbitrageError> {
    let quotes: Vec<&Quote> = event
        .quotes
        .iter()
        .filter(|q| {
            let ours = q.event_id == event.id;
            if !ours {
                warn!(
                    event = %event.id,
                    quote_event = %q.event_id,
                    bookmaker = %q.bookmaker.key,
                    "Ignoring quote attached to the wrong event"
                );
            }
            ours
        })
        .collect();

    if quotes.is_empty() {
        return Ok(BestPrices::default());
    }

    let extra_outcomes: HashSet<&str> = quotes
        .iter()
        .filter(|q| event.side_of(&q.outcome).is_none())
        .map(|q| q.outcome.as_str())
        .collect();
    if !extra_outcomes.is_empty() {
        return Err(ArbitrageError::TooManyOutcomes {
            event_id: event.id.clone(),
            outcomes: 2 + extra_outcomes.len(),
        });
    }

    let eligible = match filter {
        BookmakerFilter::All => quotes,
        BookmakerFilter::AllowList { fallback, .. } => {
            let allowed: Vec<&Quote> = quotes
                .iter()
                .copied()
                .filter(|q| filter.allows(&q.bookmaker.key))
                .collect();
            let found = distinct_bookmakers(&allowed);

            if found >= 2 {
                allowed
            } else {
                match fallback {
                    FallbackPolicy::Skip => {
                        return Err(ArbitrageError::InsufficientBookmakers {
                            event_id: event.id.clone(),
                            found,
                        })
                    }
                    FallbackPolicy::UseAll => {
                        debug!(
                            event = %event.id,
                            allowed = found,
                            total = distinct_bookmakers(&quotes),
                            "Allow-list too narrow, falling back to all bookmakers"
                        );
                        quotes
                    }
                }
            }
        }
    };

    let mut prices = SmallVec::new();
    for side in [Side::Home, Side::Away] {
        if let Some(best) = best_for_side(event, &eligible, side) {
            prices.push(BestPrice {
                side,
                outcome: best.outcome.clone(),
                bookmaker: best.bookmaker.clone(),
                odds: best.odds,
            });
        }
    }

    Ok(BestPrices { prices })
}

fn best_for_side<'a>(event: &Event, quotes: &[&'a Quote], side: Side) -> Option<&'a Quote> {
    let label = event.label(side);
    let mut best: Option<&Quote> = None;
    for quote in quotes.iter().copied().filter(|q| q.outcome == label) {
        match best {
            Some(current) if quote.odds <= current.odds => {}
            _ => best = Some(quote),
        }
    }
    best
}

fn distinct_bookmakers(quotes: &[&Quote]) -> usize {
    quotes
        .iter()
        .map(|q| q.bookmaker.key.as_str())
        .collect::<HashSet<_>>()
        .len()
}
