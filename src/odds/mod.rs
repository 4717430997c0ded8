//! Odds acquisition: wire format, normalization, HTTP client and caching.
//!
//! The engine only ever sees normalized [`Event`]s. Everything specific to the
//! Odds API lives here.

pub mod cache;
pub mod client;
pub mod feed;
pub mod mock;
pub mod types;

pub use cache::{CacheStatus, FeedKey, TtlCache};
pub use client::OddsApiClient;
pub use feed::{fetch_all, OddsCache, OddsFeed, OddsSnapshot, OddsSource};
pub use mock::{EventBuilder, StaticSource};
pub use types::{ApiEvent, Bookmaker, Event, Quote, Side, H2H_MARKET};
