//! Stale-while-revalidate content cache backed by Moka.
//!
//! Entries remember when they were fetched. A fresh entry is served as is;
//! a stale entry is served while one background refresh runs for its key;
//! a miss fetches with a deadline, and if the deadline passes the fetch
//! keeps running and fills the cache for a later request. A failed fetch
//! never replaces a cached value.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use moka::future::Cache;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Maximum number of cached entries.
const MAX_CAPACITY: u64 = 10_000;

/// Entries not read for this long are evicted regardless of freshness.
const IDLE_EVICTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead<V> {
    /// Served from cache within the revalidation window.
    Fresh(V),
    /// Served from cache past the window; a refresh is in flight.
    Stale(V),
    /// Not cached; fetched within the deadline.
    Fetched(V),
    /// Not cached; the fetch is still running in the background.
    Pending,
    /// Not cached; the fetch failed.
    Failed,
}

impl<V> CacheRead<V> {
    /// The value, if one was available for this request.
    pub fn into_value(self) -> Option<V> {
        match self {
            CacheRead::Fresh(v) | CacheRead::Stale(v) | CacheRead::Fetched(v) => Some(v),
            CacheRead::Pending | CacheRead::Failed => None,
        }
    }
}

#[derive(Clone)]
struct Entry<V> {
    value: V,
    fetched_at: Instant,
}

/// Process-wide cache keyed by route and parameters.
#[derive(Clone)]
pub struct RevalidatingCache<V> {
    inner: Arc<CacheInner<V>>,
}

struct CacheInner<V> {
    entries: Cache<String, Entry<V>>,
    /// Keys with a background refresh in flight.
    refreshing: DashMap<String, ()>,
    /// Age after which an entry is stale.
    revalidate_after: Duration,
}

impl<V> RevalidatingCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(revalidate_after: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(MAX_CAPACITY)
            .time_to_idle(IDLE_EVICTION)
            .build();

        Self {
            inner: Arc::new(CacheInner {
                entries,
                refreshing: DashMap::new(),
                revalidate_after,
            }),
        }
    }

    /// Read `key`, fetching or refreshing as needed.
    ///
    /// `deadline` bounds how long a miss waits for `fetch`. Concurrent
    /// misses on one key share a single fetch.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, deadline: Duration, fetch: F) -> CacheRead<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Display + Send + Sync + 'static,
    {
        if let Some(entry) = self.inner.entries.get(key).await {
            if entry.fetched_at.elapsed() < self.inner.revalidate_after {
                debug!(key = %key, "cache hit");
                return CacheRead::Fresh(entry.value);
            }
            debug!(key = %key, "cache stale, revalidating");
            self.spawn_refresh(key, fetch);
            return CacheRead::Stale(entry.value);
        }

        debug!(key = %key, "cache miss");
        let inner = Arc::clone(&self.inner);
        let owned_key = key.to_string();
        let task = tokio::spawn(async move {
            inner
                .entries
                .try_get_with(owned_key, async move {
                    fetch().await.map(|value| Entry {
                        value,
                        fetched_at: Instant::now(),
                    })
                })
                .await
        });

        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(Ok(entry))) => CacheRead::Fetched(entry.value),
            Ok(Ok(Err(e))) => {
                warn!(key = %key, error = %e, "content fetch failed");
                CacheRead::Failed
            }
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "content fetch task aborted");
                CacheRead::Failed
            }
            Err(_) => {
                debug!(key = %key, ?deadline, "content fetch exceeded deadline, continuing in background");
                CacheRead::Pending
            }
        }
    }

    fn spawn_refresh<F, Fut, E>(&self, key: &str, fetch: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Display + Send + Sync + 'static,
    {
        if self.inner.refreshing.insert(key.to_string(), ()).is_some() {
            debug!(key = %key, "refresh already in flight");
            return;
        }

        let inner = Arc::clone(&self.inner);
        let key = key.to_string();
        tokio::spawn(async move {
            match fetch().await {
                Ok(value) => {
                    let entry = Entry {
                        value,
                        fetched_at: Instant::now(),
                    };
                    inner.entries.insert(key.clone(), entry).await;
                    debug!(key = %key, "cache refreshed");
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "cache refresh failed, keeping stale value");
                }
            }
            inner.refreshing.remove(&key);
        });
    }
}

impl<V> std::fmt::Debug for RevalidatingCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevalidatingCache")
            .field("entries", &self.inner.entries.entry_count())
            .field("refreshing", &self.inner.refreshing.len())
            .field("revalidate_after", &self.inner.revalidate_after)
            .finish()
    }
}
