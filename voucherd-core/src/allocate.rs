//! Sequential voucher-number allocation.
//!
//! Identifiers have the form `PREFIX-MM-NNN`: a prefix derived from
//! the voucher kind and category, the two-digit month of the record
//! date, and a three-digit serial that increases monotonically per
//! prefix. The serial counter is keyed by prefix only — the month
//! segment is display-only and does not reset the counter.

use chrono::{Datelike, NaiveDate};

use crate::batch::BatchAccumulator;
use crate::types::{Snapshot, VoucherKind};

/// Compute the next voucher number for a new batch item.
///
/// The serial is the ledger's highest persisted serial for the prefix
/// plus the count of serials already reserved by items sitting in the
/// batch, plus one. Re-run this whenever the kind or category changes
/// or an item is added; numbers already assigned to batch items are
/// never recomputed.
///
/// Two sessions allocating against the same stale snapshot can
/// collide; invalidation-on-write plus the cache TTL bounds that
/// window but does not eliminate it.
pub fn voucher_no(
    kind: VoucherKind,
    category: &str,
    date: NaiveDate,
    snapshot: &Snapshot,
    batch: &BatchAccumulator,
) -> String {
    let prefix = snapshot.prefix_for(kind, category);
    let last_persisted = snapshot.last_serial(prefix);
    let reserved = batch.reserved_for_prefix(prefix) as u32;
    let serial = last_persisted + reserved + 1;
    format!("{}-{:02}-{:03}", prefix, date.month(), serial)
}
