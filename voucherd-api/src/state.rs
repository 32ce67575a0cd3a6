//! Shared state passed to all route handlers.

use std::sync::Arc;
use std::time::Instant;

use voucherd_cache::SnapshotCache;

use crate::ledger::LedgerWriter;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    /// Read path: stale-while-revalidate snapshot cache.
    pub cache: SnapshotCache,
    /// Write path: append/delete seam over the remote ledger.
    pub ledger: Arc<dyn LedgerWriter>,
    /// Optional transaction alerts; `None` disables them.
    pub notifier: Option<Arc<Notifier>>,
    /// Process start, reported by the health endpoints.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        cache: SnapshotCache,
        ledger: Arc<dyn LedgerWriter>,
        notifier: Option<Arc<Notifier>>,
    ) -> Self {
        Self {
            cache,
            ledger,
            notifier,
            started_at: Instant::now(),
        }
    }
}
