//! Fetch seam between the cache and the remote ledger.

use async_trait::async_trait;
use voucherd_core::{LedgerError, Snapshot};

/// Source of full ledger snapshots.
///
/// Abstracts the remote ledger so the cache can be exercised against
/// in-memory fetchers in tests. Implementations are expected to be
/// slow and unreliable; the cache owns the time bound around calls.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Fetch the full current ledger state.
    async fn fetch_snapshot(&self) -> Result<Snapshot, LedgerError>;
}
