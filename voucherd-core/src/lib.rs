//! voucherd Core - Voucher Data Types and Numbering
//!
//! Pure data structures and pure logic shared by the cache and API
//! layers: the canonical voucher record and ledger snapshot shapes,
//! the normalization boundary for drifting ledger JSON, the
//! sequential voucher-number allocator, and the client-side batch
//! accumulator. No I/O lives in this crate.

pub mod allocate;
pub mod batch;
pub mod error;
pub mod normalize;
pub mod types;

pub use allocate::voucher_no;
pub use batch::{BatchAccumulator, BatchItem};
pub use error::{LedgerError, ValidationError};
pub use types::{
    CategoryRow, Snapshot, VoucherKind, VoucherRecord, FALLBACK_EXPENSE_PREFIX, INCOME_PREFIX,
};
