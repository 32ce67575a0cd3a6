//! Stale-while-revalidate cache over the ledger snapshot.
//!
//! One entry per process, replaced wholesale on every successful
//! fetch. Reads never wait on a refresh once an entry exists: fresh
//! entries are served as HIT, expired entries are served as STALE
//! while a single background refresh runs. Only the very first read
//! (or the first read after an invalidation) pays the full remote
//! latency, bounded by the fetch timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::Instant;
use voucherd_core::{LedgerError, Snapshot};

use crate::fetcher::SnapshotFetcher;

/// Configuration for the snapshot cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Age beyond which a cached snapshot is considered stale.
    pub ttl: Duration,
    /// Bound on any single remote fetch, foreground or background.
    pub fetch_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(120),
            fetch_timeout: Duration::from_secs(15),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the staleness threshold.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the per-fetch time bound.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// How a read was satisfied, reported to callers as `X-Cache`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// No entry existed; the snapshot came from a foreground fetch.
    Miss,
    /// The entry was younger than the TTL.
    Hit,
    /// The entry was past the TTL; served as-is while a background
    /// refresh runs.
    Stale,
}

impl CacheStatus {
    pub fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Miss => "MISS",
            CacheStatus::Hit => "HIT",
            CacheStatus::Stale => "STALE",
        }
    }
}

/// A snapshot handed out by the cache, with freshness metadata.
#[derive(Debug, Clone)]
pub struct CacheRead {
    pub payload: Arc<Snapshot>,
    pub status: CacheStatus,
    pub fetched_at: DateTime<Utc>,
}

/// Entry metadata exposed for health reporting.
#[derive(Debug, Clone)]
pub struct CacheMeta {
    pub fetched_at: DateTime<Utc>,
    pub age: Duration,
}

#[derive(Clone)]
struct CacheEntry {
    payload: Arc<Snapshot>,
    fetched_at: DateTime<Utc>,
    fetched_instant: Instant,
}

impl CacheEntry {
    fn new(snapshot: Snapshot) -> Self {
        Self {
            payload: Arc::new(snapshot),
            fetched_at: Utc::now(),
            fetched_instant: Instant::now(),
        }
    }

    fn age(&self) -> Duration {
        self.fetched_instant.elapsed()
    }
}

struct Inner {
    fetcher: Arc<dyn SnapshotFetcher>,
    config: CacheConfig,
    entry: RwLock<Option<CacheEntry>>,
    /// Refresh latch. Two reads can both observe "stale, no refresh
    /// in flight" before either fetch suspends; the latch ensures
    /// only one of them actually starts a refresh.
    refreshing: AtomicBool,
}

impl Inner {
    async fn fetch_bounded(&self) -> Result<Snapshot, LedgerError> {
        match tokio::time::timeout(self.config.fetch_timeout, self.fetcher.fetch_snapshot()).await
        {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout {
                limit: self.config.fetch_timeout,
            }),
        }
    }

    /// Background revalidation. Failures leave the stale entry in
    /// place; the latch is cleared however the fetch settles.
    async fn refresh(&self) {
        match self.fetch_bounded().await {
            Ok(snapshot) => {
                *self.entry.write().await = Some(CacheEntry::new(snapshot));
                tracing::debug!("background refresh replaced the cached snapshot");
            }
            Err(error) => {
                tracing::warn!(%error, "background refresh failed; serving stale snapshot until the next one");
            }
        }
        self.refreshing.store(false, Ordering::Release);
    }
}

/// Process-wide read-through cache for the ledger snapshot.
///
/// Cheap to clone; clones share the entry and the refresh latch.
#[derive(Clone)]
pub struct SnapshotCache {
    inner: Arc<Inner>,
}

impl SnapshotCache {
    pub fn new(fetcher: Arc<dyn SnapshotFetcher>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                config,
                entry: RwLock::new(None),
                refreshing: AtomicBool::new(false),
            }),
        }
    }

    pub fn with_defaults(fetcher: Arc<dyn SnapshotFetcher>) -> Self {
        Self::new(fetcher, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Read the latest snapshot.
    ///
    /// HIT and STALE never touch the ledger on the caller's path. A
    /// MISS performs a foreground fetch bounded by the configured
    /// timeout; its failure is returned to the caller and nothing is
    /// cached, so the next read retries the fetch.
    pub async fn read(&self) -> Result<CacheRead, LedgerError> {
        let cached = self.inner.entry.read().await.clone();

        if let Some(entry) = cached {
            if entry.age() <= self.inner.config.ttl {
                return Ok(CacheRead {
                    payload: entry.payload,
                    status: CacheStatus::Hit,
                    fetched_at: entry.fetched_at,
                });
            }

            if self
                .inner
                .refreshing
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move { inner.refresh().await });
            }

            return Ok(CacheRead {
                payload: entry.payload,
                status: CacheStatus::Stale,
                fetched_at: entry.fetched_at,
            });
        }

        // Cold start or post-invalidation: the caller pays for the
        // fetch, once. The refresh latch is owned by the background
        // path only; touching it here could clear a latch a refresh
        // still in flight after an invalidation holds.
        let fetched = self.inner.fetch_bounded().await;

        let entry = CacheEntry::new(fetched?);
        let read = CacheRead {
            payload: Arc::clone(&entry.payload),
            status: CacheStatus::Miss,
            fetched_at: entry.fetched_at,
        };
        *self.inner.entry.write().await = Some(entry);
        Ok(read)
    }

    /// Discard the entry unconditionally.
    ///
    /// Called after every write to the ledger, successful or not,
    /// before the write's result is returned; the next read is
    /// guaranteed to be a MISS.
    pub async fn invalidate(&self) {
        *self.inner.entry.write().await = None;
        tracing::debug!("cache invalidated");
    }

    /// Entry metadata without touching the ledger.
    pub async fn peek(&self) -> Option<CacheMeta> {
        self.inner.entry.read().await.as_ref().map(|entry| CacheMeta {
            fetched_at: entry.fetched_at,
            age: entry.age(),
        })
    }
}
