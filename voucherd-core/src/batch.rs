//! Client-side accumulator for not-yet-persisted vouchers.

use crate::types::VoucherRecord;

/// One voucher waiting in the batch, keyed by a client-local id.
///
/// The local id exists only so the UI can remove a line without
/// touching the voucher identifier, which is assigned once at add
/// time and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub local_id: u64,
    pub record: VoucherRecord,
}

/// Ordered, append-only-until-submit list of batch items.
#[derive(Debug, Clone, Default)]
pub struct BatchAccumulator {
    items: Vec<BatchItem>,
    next_local_id: u64,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record whose voucher number was already allocated.
    /// Returns the client-local id for later removal.
    pub fn add(&mut self, record: VoucherRecord) -> u64 {
        let local_id = self.next_local_id;
        self.next_local_id += 1;
        self.items.push(BatchItem { local_id, record });
        local_id
    }

    /// Remove by client-local id. Returns false if no such item.
    pub fn remove(&mut self, local_id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.local_id != local_id);
        self.items.len() != before
    }

    /// Empty the batch after a successful full submit.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of cost_total across the batch.
    pub fn total(&self) -> i64 {
        self.items.iter().map(|item| item.record.cost_total).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchItem> {
        self.items.iter()
    }

    /// How many batch items already reserve a serial under `prefix`.
    ///
    /// This is what keeps allocation gap-free while several records
    /// sit in the batch before any of them reach the ledger.
    pub fn reserved_for_prefix(&self, prefix: &str) -> usize {
        self.items
            .iter()
            .filter(|item| {
                item.record
                    .voucher_no
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('-'))
            })
            .count()
    }
}
