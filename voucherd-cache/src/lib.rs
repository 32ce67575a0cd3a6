//! voucherd Cache - Stale-While-Revalidate Snapshot Cache
//!
//! Serves ledger snapshots from a single time-bounded cache entry,
//! revalidating stale entries in the background instead of blocking
//! readers on the slow remote ledger. Writes invalidate the entry so
//! the next read is forced through to the ledger.

pub mod fetcher;
pub mod swr;

pub use fetcher::SnapshotFetcher;
pub use swr::{CacheConfig, CacheMeta, CacheRead, CacheStatus, SnapshotCache};
