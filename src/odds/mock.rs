//! Fixture builders for odds data.
//!
//! Used by unit and integration tests to assemble normalized events
//! without going through the Odds API.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use crate::error::FeedError;

use super::feed::{OddsSnapshot, OddsSource};
use super::types::{Bookmaker, Event, Side};

/// Builder for a normalized [`Event`].
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    /// Start a new event between `home` and `away`.
    ///
    /// Defaults to sport `basketball_nba` and a start one hour from now.
    pub fn new(id: &str, home: &str, away: &str) -> Self {
        Self {
            event: Event {
                id: id.to_string(),
                sport_key: "basketball_nba".to_string(),
                sport_title: "NBA".to_string(),
                home: home.to_string(),
                away: away.to_string(),
                commence_time: OffsetDateTime::now_utc() + Duration::hours(1),
                quotes: Vec::new(),
            },
        }
    }

    /// Set the sport key and title.
    pub fn sport(mut self, key: &str, title: &str) -> Self {
        self.event.sport_key = key.to_string();
        self.event.sport_title = title.to_string();
        self
    }

    /// Set the scheduled start.
    pub fn starts_at(mut self, commence_time: OffsetDateTime) -> Self {
        self.event.commence_time = commence_time;
        self
    }

    /// Add a quote for one side. The bookmaker title is derived from the key.
    pub fn quote(self, bookmaker: &str, side: Side, odds: Decimal) -> Self {
        let outcome = self.event.label(side).to_string();
        self.outcome_quote(bookmaker, &outcome, odds)
    }

    /// Add a quote for an arbitrary outcome label (e.g. "Draw").
    pub fn outcome_quote(mut self, bookmaker: &str, outcome: &str, odds: Decimal) -> Self {
        self.event
            .push_quote(Bookmaker::new(bookmaker, title_for(bookmaker)), outcome, odds);
        self
    }

    /// Add both sides for one bookmaker.
    pub fn prices(self, bookmaker: &str, home: Decimal, away: Decimal) -> Self {
        self.quote(bookmaker, Side::Home, home)
            .quote(bookmaker, Side::Away, away)
    }

    /// Finish the event.
    pub fn build(self) -> Event {
        self.event
    }
}

/// In-memory [`OddsSource`] serving a fixed event list.
///
/// `None` behaves like an upstream where every sport failed.
#[derive(Debug, Default)]
pub struct StaticSource {
    events: RwLock<Option<Vec<Event>>>,
    calls: AtomicUsize,
}

impl StaticSource {
    /// Source that always returns `events`.
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: RwLock::new(Some(events)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Source whose fetches always fail.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Replace the served events.
    pub async fn set_events(&self, events: Option<Vec<Event>>) {
        *self.events.write().await = events;
    }

    /// Number of snapshots requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OddsSource for StaticSource {
    fn snapshot(&self) -> impl Future<Output = Result<OddsSnapshot, FeedError>> + Send {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.events.read().await.as_ref() {
                Some(events) => Ok(OddsSnapshot::new(events.clone())),
                None => Err(FeedError::NoData {
                    sports: vec!["mock".to_string()],
                }),
            }
        }
    }
}

fn title_for(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
