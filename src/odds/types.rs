//! Normalized odds data and the Odds API wire format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::error::FeedError;

/// Market key for two-way head-to-head (moneyline) odds.
pub const H2H_MARKET: &str = "h2h";

/// Side of a two-way event.
///
/// `Home` is outcome A and `Away` is outcome B. The home label is whatever
/// the adapter declared first for the event, never the first quote seen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    /// First declared outcome (outcome A).
    #[default]
    Home,
    /// Second declared outcome (outcome B).
    Away,
}

/// A bookmaker as identified by the odds source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bookmaker {
    /// Stable identifier (e.g. "pinnacle"), used by allow-lists.
    pub key: String,
    /// Display name (e.g. "Pinnacle").
    pub title: String,
    /// Bookmaker page for the event, when the source provides one.
    pub link: Option<String>,
}

impl Bookmaker {
    /// Create a bookmaker.
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            link: None,
        }
    }

    /// Attach the bookmaker's event page.
    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link.filter(|l| !l.is_empty());
        self
    }
}

/// One bookmaker's decimal price for one outcome of one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Event the quote belongs to.
    pub event_id: String,
    /// Outcome label (team or player name).
    pub outcome: String,
    /// Quoting bookmaker.
    pub bookmaker: Bookmaker,
    /// Decimal odds.
    pub odds: Decimal,
}

/// A scheduled two-way contest with its quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event identifier from the odds source.
    pub id: String,
    /// Sport key (e.g. "basketball_nba").
    pub sport_key: String,
    /// Human readable sport or league title (e.g. "NBA").
    pub sport_title: String,
    /// Outcome A label.
    pub home: String,
    /// Outcome B label.
    pub away: String,
    /// Scheduled start, UTC.
    pub commence_time: OffsetDateTime,
    /// Quotes in the order the source delivered them.
    pub quotes: Vec<Quote>,
}

impl Event {
    /// Get the outcome label for a side.
    pub fn label(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    /// Map an outcome label back to a side, if it is one of the two declared outcomes.
    pub fn side_of(&self, outcome: &str) -> Option<Side> {
        if outcome == self.home {
            Some(Side::Home)
        } else if outcome == self.away {
            Some(Side::Away)
        } else {
            None
        }
    }

    /// Start date in UTC.
    pub fn start_date(&self) -> Date {
        self.commence_time.to_offset(UtcOffset::UTC).date()
    }

    /// Append a quote for this event.
    pub fn push_quote(&mut self, bookmaker: Bookmaker, outcome: impl Into<String>, odds: Decimal) {
        self.quotes.push(Quote {
            event_id: self.id.clone(),
            outcome: outcome.into(),
            bookmaker,
            odds,
        });
    }
}

/// Event as returned by `GET /v4/sports/{sport}/odds`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEvent {
    /// Event id.
    pub id: String,
    /// Sport key.
    pub sport_key: String,
    /// Sport title.
    #[serde(default)]
    pub sport_title: Option<String>,
    /// ISO-8601 start time.
    pub commence_time: String,
    /// Home team or first player.
    pub home_team: Option<String>,
    /// Away team or second player.
    pub away_team: Option<String>,
    /// Bookmaker odds.
    #[serde(default)]
    pub bookmakers: Vec<ApiBookmaker>,
}

/// Bookmaker block in an API event.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiBookmaker {
    /// Bookmaker key.
    pub key: String,
    /// Bookmaker title.
    pub title: String,
    /// Event page, present when requested with `includeLinks=true`.
    #[serde(default)]
    pub link: Option<String>,
    /// Markets quoted by the bookmaker.
    #[serde(default)]
    pub markets: Vec<ApiMarket>,
}

/// Market block in an API bookmaker.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMarket {
    /// Market key ("h2h", "spreads", ...).
    pub key: String,
    /// Outcome prices.
    #[serde(default)]
    pub outcomes: Vec<ApiOutcome>,
}

/// Single outcome price.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiOutcome {
    /// Outcome name.
    pub name: String,
    /// Decimal price.
    pub price: Decimal,
}

impl ApiEvent {
    /// Normalize into an [`Event`], keeping only head-to-head quotes.
    pub fn into_event(self) -> Result<Event, FeedError> {
        let commence_time = OffsetDateTime::parse(&self.commence_time, &Rfc3339)
            .map_err(|e| {
                FeedError::ParseError(format!(
                    "event {}: bad commence_time {:?}: {}",
                    self.id, self.commence_time, e
                ))
            })?
            .to_offset(UtcOffset::UTC);

        let (home, away) = match (self.home_team, self.away_team) {
            (Some(home), Some(away)) if home != away => (home, away),
            _ => {
                return Err(FeedError::ParseError(format!(
                    "event {}: missing or identical participants",
                    self.id
                )))
            }
        };

        let mut event = Event {
            sport_title: self.sport_title.unwrap_or_else(|| self.sport_key.clone()),
            id: self.id,
            sport_key: self.sport_key,
            home,
            away,
            commence_time,
            quotes: Vec::new(),
        };

        for bookmaker in self.bookmakers {
            let book = Bookmaker::new(bookmaker.key, bookmaker.title).with_link(bookmaker.link);
            for market in bookmaker.markets.into_iter().filter(|m| m.key == H2H_MARKET) {
                for outcome in market.outcomes {
                    event.push_quote(book.clone(), outcome.name, outcome.price);
                }
            }
        }

        Ok(event)
    }
}
