//! Cached multi-sport odds feed.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::FeedError;
use crate::metrics;

use super::cache::{CacheStatus, FeedKey, TtlCache};
use super::client::OddsApiClient;
use super::types::Event;

/// Events for a set of sports, fetched at one point in time.
#[derive(Debug, Clone)]
pub struct OddsSnapshot {
    /// Normalized events across all sports that answered.
    pub events: Arc<Vec<Event>>,
    /// Sports whose request failed.
    pub failed_sports: Vec<String>,
    /// When the upstream fetch completed.
    pub fetched_at: OffsetDateTime,
}

impl OddsSnapshot {
    /// Snapshot over `events` with no failures, stamped now.
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: Arc::new(events),
            failed_sports: Vec::new(),
            fetched_at: OffsetDateTime::now_utc(),
        }
    }

    /// Number of events in the snapshot.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the snapshot holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Anything that can produce an odds snapshot.
pub trait OddsSource: Send + Sync {
    /// Current snapshot, possibly served from a cache.
    fn snapshot(&self) -> impl Future<Output = Result<OddsSnapshot, FeedError>> + Send;
}

/// Cache type used by [`OddsFeed`].
pub type OddsCache = TtlCache<FeedKey, OddsSnapshot>;

/// Odds API client behind a TTL cache.
pub struct OddsFeed {
    client: OddsApiClient,
    cache: OddsCache,
    sports: Vec<String>,
    regions: Vec<String>,
}

impl OddsFeed {
    /// Create a feed for the given sports and regions.
    pub fn new(client: OddsApiClient, cache: OddsCache, sports: Vec<String>, regions: Vec<String>) -> Self {
        Self {
            client,
            cache,
            sports,
            regions,
        }
    }

    /// Create a feed from config.
    pub fn from_config(config: &Config) -> Result<Self, FeedError> {
        Ok(Self::new(
            OddsApiClient::new(config)?,
            OddsCache::new(config.cache_ttl()),
            config.sports.clone(),
            config.regions.clone(),
        ))
    }

    /// Snapshot for an explicit sport list, using the cache.
    pub async fn snapshot_for(&self, sports: &[String]) -> Result<OddsSnapshot, FeedError> {
        let key = FeedKey::new(sports, &self.regions);
        let (snapshot, status) = self
            .cache
            .get_or_fetch(&key, || fetch_all(&self.client, sports, &self.regions))
            .await?;

        match status {
            CacheStatus::Hit => metrics::inc_cache_hits(),
            CacheStatus::Miss => metrics::inc_cache_misses(),
        }

        Ok(snapshot)
    }
}

impl OddsSource for OddsFeed {
    fn snapshot(&self) -> impl Future<Output = Result<OddsSnapshot, FeedError>> + Send {
        self.snapshot_for(&self.sports)
    }
}

/// Fetch every sport concurrently and merge the results.
///
/// A failing sport is logged and reported in `failed_sports`. When every
/// sport fails the call fails: with the upstream error when it was an auth or
/// quota problem, otherwise with [`FeedError::NoData`].
#[instrument(skip_all, fields(sports = sports.len()))]
pub async fn fetch_all(
    client: &OddsApiClient,
    sports: &[String],
    regions: &[String],
) -> Result<OddsSnapshot, FeedError> {
    let results = join_all(sports.iter().map(|sport| client.fetch_sport(sport, regions))).await;

    let mut events = Vec::new();
    let mut failed_sports = Vec::new();
    let mut fatal = None;

    for (sport, result) in sports.iter().zip(results) {
        match result {
            Ok(mut sport_events) => events.append(&mut sport_events),
            Err(e) => {
                warn!(sport = %sport, error = %e, "Odds fetch failed");
                metrics::inc_odds_fetch_failures(sport);
                failed_sports.push(sport.clone());
                if matches!(e, FeedError::Unauthorized | FeedError::QuotaExhausted) {
                    fatal.get_or_insert(e);
                }
            }
        }
    }

    if !sports.is_empty() && failed_sports.len() == sports.len() {
        return Err(fatal.unwrap_or(FeedError::NoData {
            sports: sports.to_vec(),
        }));
    }

    info!(
        events = events.len(),
        failed = failed_sports.len(),
        "Fetched odds snapshot"
    );

    Ok(OddsSnapshot {
        events: Arc::new(events),
        failed_sports,
        fetched_at: OffsetDateTime::now_utc(),
    })
}
