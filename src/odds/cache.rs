//! Time-to-live cache with single-flight fetches.
//!
//! Each key owns an async mutex. The first caller for a stale or empty key
//! fetches while holding it; concurrent callers for the same key wait and then
//! read the freshly stored value instead of issuing their own request.

use std::collections::BTreeSet;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::types::H2H_MARKET;

/// Whether a lookup was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Fresh entry returned.
    Hit,
    /// Value fetched from upstream.
    Miss,
}

/// Cache key for an odds request.
///
/// Sports and regions are sets, so request order does not create new keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedKey {
    /// Requested sport keys.
    pub sports: BTreeSet<String>,
    /// Requested bookmaker regions.
    pub regions: BTreeSet<String>,
    /// Market type.
    pub market: String,
}

impl FeedKey {
    /// Key for a head-to-head request.
    pub fn new(sports: &[String], regions: &[String]) -> Self {
        Self {
            sports: sports.iter().cloned().collect(),
            regions: regions.iter().cloned().collect(),
            market: H2H_MARKET.to_string(),
        }
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

type Slot<V> = Arc<Mutex<Option<Entry<V>>>>;

/// Concurrent TTL cache keyed by request parameters.
pub struct TtlCache<K, V> {
    ttl: Duration,
    slots: DashMap<K, Slot<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache whose entries expire `ttl` after being stored.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: DashMap::new(),
        }
    }

    /// Return the cached value for `key`, or run `fetch` and store its result.
    ///
    /// Errors are returned to the caller and never cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &K, fetch: F) -> Result<(V, CacheStatus), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slots.entry(key.clone()).or_default().clone();
        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref() {
            if entry.stored_at.elapsed() < self.ttl {
                return Ok((entry.value.clone(), CacheStatus::Hit));
            }
        }

        let value = fetch().await?;
        *guard = Some(Entry {
            value: value.clone(),
            stored_at: Instant::now(),
        });
        Ok((value, CacheStatus::Miss))
    }

    /// Drop the entry for `key`.
    pub fn invalidate(&self, key: &K) {
        self.slots.remove(key);
    }

    /// Number of keys seen (fresh or stale).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the cache holds no keys.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
